use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{NavigateRequest, SelectOptionRequest, StartQuizSessionRequest},
        response::QuizHistoryResponse,
    },
};

#[post("/quiz-sessions")]
pub async fn start_quiz_session(
    state: web::Data<Arc<AppState>>,
    request: web::Json<StartQuizSessionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let controller = state
        .quiz_session_service
        .start_session(auth.user_id(), &request.course_id)
        .await?;
    Ok(HttpResponse::Created().json(controller.snapshot().await))
}

#[get("/quiz-sessions/{id}")]
pub async fn get_quiz_session(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let controller = state
        .quiz_session_service
        .get_session(auth.user_id(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

#[post("/quiz-sessions/{id}/answer")]
pub async fn select_option(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
    request: web::Json<SelectOptionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let controller = state
        .quiz_session_service
        .get_session(auth.user_id(), &id)
        .await?;
    controller.select_option(request.option_index).await;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

#[post("/quiz-sessions/{id}/navigate")]
pub async fn navigate(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
    request: web::Json<NavigateRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let controller = state
        .quiz_session_service
        .get_session(auth.user_id(), &id)
        .await?;
    controller.go_to(request.index).await;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

#[post("/quiz-sessions/{id}/next")]
pub async fn next_question(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let controller = state
        .quiz_session_service
        .get_session(auth.user_id(), &id)
        .await?;
    controller.next().await;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

#[post("/quiz-sessions/{id}/previous")]
pub async fn previous_question(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let controller = state
        .quiz_session_service
        .get_session(auth.user_id(), &id)
        .await?;
    controller.previous().await;
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

#[post("/quiz-sessions/{id}/finish")]
pub async fn finish_quiz_session(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let controller = state
        .quiz_session_service
        .get_session(auth.user_id(), &id)
        .await?;
    if controller.finish().await.is_none() {
        log::debug!("Finish ignored for session {}: not active", controller.id());
    }
    Ok(HttpResponse::Ok().json(controller.snapshot().await))
}

#[delete("/quiz-sessions/{id}")]
pub async fn abandon_quiz_session(
    state: web::Data<Arc<AppState>>,
    id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state
        .quiz_session_service
        .abandon_session(auth.user_id(), &id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/quiz-results")]
pub async fn quiz_history(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let results = state.quiz_session_service.quiz_history(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(QuizHistoryResponse { results }))
}

#[get("/quiz-results/{course_id}")]
pub async fn last_quiz_result(
    state: web::Data<Arc<AppState>>,
    course_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state
        .quiz_session_service
        .last_result(auth.user_id(), &course_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No quiz result for course '{}'", course_id))
        })?;
    Ok(HttpResponse::Ok().json(result))
}

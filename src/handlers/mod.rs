pub mod health_handler;
pub mod quiz_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub use health_handler::health_check;
pub use quiz_handler::{
    abandon_quiz_session, finish_quiz_session, get_quiz_session, last_quiz_result, navigate,
    next_question, previous_question, quiz_history, select_option, start_quiz_session,
};

/// Registers every route. Everything under `/api` requires a bearer token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check).service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            .service(start_quiz_session)
            .service(get_quiz_session)
            .service(select_option)
            .service(navigate)
            .service(next_question)
            .service(previous_question)
            .service(finish_quiz_session)
            .service(abandon_quiz_session)
            .service(quiz_history)
            .service(last_quiz_result),
    );
}

use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        CourseRepository, MongoCourseRepository, MongoQuizResultRepository, QuizResultRepository,
    },
    services::{
        question_source::{OpenAiQuestionSource, QuestionSource},
        quiz_session_service::{QuizSessionService, FINISHED_SESSION_GRACE, SWEEP_PERIOD},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_session_service: Arc<QuizSessionService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let course_repository = Arc::new(MongoCourseRepository::new(&db, &config.courses_collection));
        course_repository.ensure_indexes().await?;

        let result_repository = Arc::new(MongoQuizResultRepository::new(
            &db,
            &config.quiz_results_collection,
        ));
        result_repository.ensure_indexes().await?;

        let question_source = Arc::new(OpenAiQuestionSource::new(&config));

        let state = Self::from_parts(
            config,
            course_repository,
            result_repository,
            question_source,
            Arc::new(SystemClock),
        );
        state
            .quiz_session_service
            .spawn_sweeper(SWEEP_PERIOD, FINISHED_SESSION_GRACE);

        Ok(state)
    }

    /// Wires the state from already-built collaborators.
    pub fn from_parts(
        config: Config,
        courses: Arc<dyn CourseRepository>,
        results: Arc<dyn QuizResultRepository>,
        source: Arc<dyn QuestionSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let quiz_session_service = Arc::new(QuizSessionService::new(courses, results, source, clock));

        Self {
            quiz_session_service,
            config: Arc::new(config),
        }
    }
}

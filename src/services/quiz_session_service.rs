use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::RwLock,
    task::JoinHandle,
    time::{interval_at, Instant},
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    errors::{AppError, AppResult},
    models::domain::QuizResult,
    repositories::{CourseRepository, QuizResultRepository},
    services::{
        question_source::QuestionSource, quiz_session::SessionPhase,
        session_controller::QuizSessionController,
    },
};

/// How long a finished attempt stays readable before the sweeper forgets it.
pub const FINISHED_SESSION_GRACE: Duration = Duration::from_secs(300);
pub const SWEEP_PERIOD: Duration = Duration::from_secs(30);

/// Live quiz attempts, keyed by session id. Each attempt is independent of the others.
pub struct QuizSessionService {
    courses: Arc<dyn CourseRepository>,
    results: Arc<dyn QuizResultRepository>,
    source: Arc<dyn QuestionSource>,
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<Uuid, Arc<QuizSessionController>>>,
}

impl QuizSessionService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        results: Arc<dyn QuizResultRepository>,
        source: Arc<dyn QuestionSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            courses,
            results,
            source,
            clock,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn start_session(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Arc<QuizSessionController>> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course with id '{}' not found", course_id)))?;

        let controller = Arc::new(QuizSessionController::new(
            user_id,
            &course.id,
            Arc::clone(&self.source),
            Arc::clone(&self.results),
            Arc::clone(&self.clock),
        ));

        controller.start(&course.title, &course.description).await?;

        self.prune_finished(user_id).await;
        self.sessions
            .write()
            .await
            .insert(controller.id(), Arc::clone(&controller));

        Ok(controller)
    }

    pub async fn get_session(
        &self,
        user_id: &str,
        session_id: &Uuid,
    ) -> AppResult<Arc<QuizSessionController>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .filter(|controller| controller.user_id() == user_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("Quiz session with id '{}' not found", session_id))
            })
    }

    /// Cancels the attempt's countdown and forgets it. Nothing is persisted. An attempt that is
    /// never abandoned explicitly runs until the time limit; if nobody touched it for
    /// [`ABANDON_AFTER_IDLE`](crate::services::session_controller::ABANDON_AFTER_IDLE) by then,
    /// it is discarded the same way.
    pub async fn abandon_session(&self, user_id: &str, session_id: &Uuid) -> AppResult<()> {
        let controller = self.get_session(user_id, session_id).await?;
        controller.dispose().await;
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    pub async fn quiz_history(&self, user_id: &str) -> AppResult<Vec<QuizResult>> {
        self.results.find_by_user(user_id).await
    }

    pub async fn last_result(&self, user_id: &str, course_id: &str) -> AppResult<Option<QuizResult>> {
        self.results.find_by_user_and_course(user_id, course_id).await
    }

    pub async fn active_session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Forgets attempts that finished at least `grace` ago. Returns how many were removed.
    pub async fn evict_finished(&self, grace: Duration) -> usize {
        let controllers: Vec<Arc<QuizSessionController>> =
            self.sessions.read().await.values().cloned().collect();

        let mut stale = Vec::new();
        for controller in controllers {
            if let Some(finished_at) = controller.finished_at().await {
                if finished_at.elapsed() >= grace {
                    stale.push(controller.id());
                }
            }
        }

        if !stale.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &stale {
                sessions.remove(id);
            }
            log::debug!("Evicted {} finished quiz sessions", stale.len());
        }
        stale.len()
    }

    /// Runs [`evict_finished`](Self::evict_finished) every `period` until the service is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration, grace: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(service) = weak.upgrade() else {
                    break;
                };
                service.evict_finished(grace).await;
            }
        })
    }

    /// Drops the user's finished attempts; starting a new one means their results were left.
    async fn prune_finished(&self, user_id: &str) {
        let owned: Vec<Arc<QuizSessionController>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|controller| controller.user_id() == user_id)
            .cloned()
            .collect();

        let mut finished = Vec::new();
        for controller in owned {
            if controller.phase().await == SessionPhase::Finished {
                finished.push(controller.id());
            }
        }

        if !finished.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &finished {
                sessions.remove(id);
            }
            log::debug!("Pruned {} finished sessions for user {}", finished.len(), user_id);
        }
    }
}

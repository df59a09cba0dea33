use std::{
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
    time::{interval_at, Instant},
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    errors::{AppError, AppResult, ResultPersistenceWarning},
    models::{domain::QuizResult, dto::response::QuizSessionView},
    repositories::QuizResultRepository,
    services::{
        question_source::QuestionSource,
        quiz_session::{QuizSession, SessionPhase},
    },
};

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// An attempt that runs out of time after this long without any caller activity counts as
/// abandoned: it is finished but its result is not stored.
pub const ABANDON_AFTER_IDLE: Duration = Duration::from_secs(120);

/// Result of finishing an attempt. The score is final even when `warning` is set.
#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub result: QuizResult,
    pub warning: Option<ResultPersistenceWarning>,
}

struct SessionState {
    session: QuizSession,
    countdown: Option<JoinHandle<()>>,
    persistence_warning: Option<ResultPersistenceWarning>,
    last_activity: Instant,
    finished_at: Option<Instant>,
}

impl SessionState {
    fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    /// Stops the countdown and scores the attempt; `None` unless the session was active.
    fn finish(&mut self) -> Option<QuizResult> {
        if self.session.phase() != SessionPhase::Active {
            return None;
        }
        self.stop_countdown();
        self.finished_at = Some(Instant::now());
        self.session.finish()
    }
}

/// Drives one attempt: owns the session, its countdown task and its collaborators.
pub struct QuizSessionController {
    id: Uuid,
    user_id: String,
    state: Arc<Mutex<SessionState>>,
    source: Arc<dyn QuestionSource>,
    sink: Arc<dyn QuizResultRepository>,
}

impl QuizSessionController {
    pub fn new(
        user_id: &str,
        course_id: &str,
        source: Arc<dyn QuestionSource>,
        sink: Arc<dyn QuizResultRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            state: Arc::new(Mutex::new(SessionState {
                session: QuizSession::new(course_id, clock),
                countdown: None,
                persistence_warning: None,
                last_activity: Instant::now(),
                finished_at: None,
            })),
            source,
            sink,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Fetches the questions and, on success, activates the session and starts the countdown.
    pub async fn start(&self, course_title: &str, course_description: &str) -> AppResult<()> {
        if self.phase().await != SessionPhase::Loading {
            return Err(AppError::InternalError(
                "Quiz session has already been started".to_string(),
            ));
        }

        let questions = self
            .source
            .generate_quiz(course_title, course_description)
            .await
            .map_err(|e| {
                log::warn!("Could not generate quiz for session {}: {}", self.id, e);
                match e {
                    AppError::QuestionSource(msg) => AppError::QuestionSource(msg),
                    other => AppError::QuestionSource(other.to_string()),
                }
            })?;

        let mut state = self.lock_touched().await;
        state.session.activate(questions)?;
        state.countdown = Some(spawn_countdown(
            Arc::downgrade(&self.state),
            self.id,
            self.user_id.clone(),
            Arc::clone(&self.sink),
        ));

        log::info!("Quiz session {} started for user {}", self.id, self.user_id);
        Ok(())
    }

    /// Locks the state and records caller activity.
    async fn lock_touched(&self) -> MutexGuard<'_, SessionState> {
        let mut state = self.state.lock().await;
        state.last_activity = Instant::now();
        state
    }

    pub async fn select_option(&self, option_index: usize) -> bool {
        self.lock_touched().await.session.select_option(option_index)
    }

    pub async fn go_to(&self, index: usize) -> bool {
        self.lock_touched().await.session.go_to(index)
    }

    pub async fn previous(&self) -> bool {
        self.lock_touched().await.session.previous()
    }

    /// Moves to the next question, or submits when already on the last one.
    pub async fn next(&self) -> Option<FinishOutcome> {
        let result = {
            let mut state = self.lock_touched().await;
            if state.session.phase() != SessionPhase::Active {
                return None;
            }
            if state.session.current_index() + 1 < state.session.questions().len() {
                state.session.next();
                return None;
            }
            state.finish()?
        };
        Some(self.complete(result).await)
    }

    /// Submits the attempt. Only the first call has any effect.
    pub async fn finish(&self) -> Option<FinishOutcome> {
        let result = self.lock_touched().await.finish()?;
        Some(self.complete(result).await)
    }

    async fn complete(&self, result: QuizResult) -> FinishOutcome {
        let warning = persist_result(self.sink.as_ref(), &self.user_id, &result).await;
        if let Some(warning) = &warning {
            self.state.lock().await.persistence_warning = Some(warning.clone());
        }
        FinishOutcome { result, warning }
    }

    /// Abandons the attempt: the countdown stops and nothing is persisted.
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        state.stop_countdown();
        if state.session.phase() == SessionPhase::Active {
            log::info!("Quiz session {} abandoned by user {}", self.id, self.user_id);
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.session.phase()
    }

    pub async fn time_remaining(&self) -> u32 {
        self.state.lock().await.session.time_remaining()
    }

    pub async fn result(&self) -> Option<QuizResult> {
        self.state.lock().await.session.result().cloned()
    }

    pub async fn persistence_warning(&self) -> Option<ResultPersistenceWarning> {
        self.state.lock().await.persistence_warning.clone()
    }

    pub async fn has_countdown(&self) -> bool {
        self.state.lock().await.countdown.is_some()
    }

    /// When the attempt finished, on the runtime clock; `None` while it is still running.
    pub async fn finished_at(&self) -> Option<Instant> {
        self.state.lock().await.finished_at
    }

    /// Read-only view for rendering. Reading it counts as activity.
    pub async fn snapshot(&self) -> QuizSessionView {
        let state = self.lock_touched().await;
        QuizSessionView::build(self.id, &state.session, state.persistence_warning.as_ref())
    }
}

impl fmt::Debug for QuizSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSessionController")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Drop for QuizSessionController {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            state.stop_countdown();
        }
    }
}

fn spawn_countdown(
    state: Weak<Mutex<SessionState>>,
    session_id: Uuid,
    user_id: String,
    sink: Arc<dyn QuizResultRepository>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + COUNTDOWN_PERIOD, COUNTDOWN_PERIOD);

        loop {
            ticker.tick().await;

            let Some(state) = state.upgrade() else {
                break;
            };

            let (expired, idle) = {
                let mut guard = state.lock().await;
                if guard.session.phase() != SessionPhase::Active {
                    break;
                }
                let expired = guard.session.tick();
                if expired.is_some() {
                    // Detach rather than abort: this task still has to persist the result.
                    guard.countdown.take();
                    guard.finished_at = Some(Instant::now());
                }
                (expired, guard.last_activity.elapsed())
            };

            if let Some(result) = expired {
                if idle >= ABANDON_AFTER_IDLE {
                    log::info!(
                        "Quiz session {} ran out of time after {}s without activity; result discarded",
                        session_id,
                        idle.as_secs()
                    );
                    break;
                }
                log::info!("Quiz session {} ran out of time", session_id);
                if let Some(warning) = persist_result(sink.as_ref(), &user_id, &result).await {
                    state.lock().await.persistence_warning = Some(warning);
                }
                break;
            }
        }
    })
}

async fn persist_result(
    sink: &dyn QuizResultRepository,
    user_id: &str,
    result: &QuizResult,
) -> Option<ResultPersistenceWarning> {
    match sink.save(user_id, result.clone()).await {
        Ok(_) => {
            log::info!(
                "Saved quiz result for user {} on course {}",
                user_id,
                result.course_id
            );
            None
        }
        Err(e) => {
            log::warn!(
                "Failed to save quiz result for user {} on course {}: {}",
                user_id,
                result.course_id,
                e
            );
            Some(ResultPersistenceWarning(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock, repositories::quiz_result_repository::MockQuizResultRepository,
        services::question_source::MockQuestionSource, test_utils::fixtures::sample_questions,
    };

    fn source_returning(count: usize) -> Arc<dyn QuestionSource> {
        let mut source = MockQuestionSource::new();
        source
            .expect_generate_quiz()
            .returning(move |_, _| Ok(sample_questions(count)));
        Arc::new(source)
    }

    fn sink_expecting(times: usize, fail: bool) -> Arc<dyn QuizResultRepository> {
        let mut sink = MockQuizResultRepository::new();
        sink.expect_save().times(times).returning(move |_, result| {
            if fail {
                Err(AppError::DatabaseError("write rejected".to_string()))
            } else {
                Ok(result)
            }
        });
        Arc::new(sink)
    }

    fn controller(
        source: Arc<dyn QuestionSource>,
        sink: Arc<dyn QuizResultRepository>,
    ) -> (QuizSessionController, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let controller = QuizSessionController::new("user-1", "rust-101", source, sink, clock.clone());
        (controller, clock)
    }

    #[tokio::test]
    async fn start_activates_and_arms_countdown() {
        let (controller, _) = controller(source_returning(10), sink_expecting(0, false));

        controller.start("Rust", "Ownership").await.unwrap();

        assert_eq!(controller.phase().await, SessionPhase::Active);
        assert!(controller.has_countdown().await);
    }

    #[tokio::test]
    async fn short_question_list_keeps_session_loading() {
        let (controller, _) = controller(source_returning(8), sink_expecting(0, false));

        let err = controller.start("Rust", "Ownership").await.unwrap_err();

        assert!(matches!(err, AppError::QuestionSource(_)));
        assert_eq!(controller.phase().await, SessionPhase::Loading);
        assert!(!controller.has_countdown().await);
    }

    #[tokio::test]
    async fn invalid_course_text_is_reported_as_question_source_error() {
        let mut source = MockQuestionSource::new();
        source.expect_generate_quiz().returning(|_, _| {
            Err(AppError::ValidationError("Course title must not be empty".to_string()))
        });
        let (controller, _) = controller(Arc::new(source), sink_expecting(0, false));

        let err = controller.start("", "Ownership").await.unwrap_err();

        assert!(matches!(err, AppError::QuestionSource(_)));
        assert_eq!(controller.phase().await, SessionPhase::Loading);
    }

    #[tokio::test]
    async fn source_failure_is_reported_as_question_source_error() {
        let mut source = MockQuestionSource::new();
        source
            .expect_generate_quiz()
            .returning(|_, _| Err(AppError::InternalError("upstream timeout".to_string())));
        let (controller, _) = controller(Arc::new(source), sink_expecting(0, false));

        let err = controller.start("Rust", "Ownership").await.unwrap_err();

        assert!(matches!(err, AppError::QuestionSource(_)));
        assert_eq!(controller.phase().await, SessionPhase::Loading);
    }

    #[tokio::test]
    async fn finish_persists_once_and_stops_countdown() {
        let (controller, clock) = controller(source_returning(10), sink_expecting(1, false));
        controller.start("Rust", "Ownership").await.unwrap();

        clock.advance(4.0);
        let outcome = controller.finish().await.expect("first finish yields an outcome");

        assert!(outcome.warning.is_none());
        assert_eq!(outcome.result.time_taken, 4);
        assert!(!controller.has_countdown().await);
        assert!(controller.finish().await.is_none());
    }

    #[tokio::test]
    async fn sink_failure_becomes_warning_without_undoing_finish() {
        let (controller, _) = controller(source_returning(10), sink_expecting(1, true));
        controller.start("Rust", "Ownership").await.unwrap();
        controller.select_option(0).await;

        let outcome = controller.finish().await.unwrap();

        assert!(outcome.warning.is_some());
        assert_eq!(outcome.result.score, 1);
        assert_eq!(controller.phase().await, SessionPhase::Finished);
        assert_eq!(controller.persistence_warning().await, outcome.warning);
    }

    #[tokio::test]
    async fn next_on_last_question_submits() {
        let (controller, _) = controller(source_returning(10), sink_expecting(1, false));
        controller.start("Rust", "Ownership").await.unwrap();

        for _ in 0..9 {
            assert!(controller.next().await.is_none());
        }
        let outcome = controller.next().await;

        assert!(outcome.is_some());
        assert_eq!(controller.phase().await, SessionPhase::Finished);
    }

    #[tokio::test]
    async fn dispose_cancels_countdown_without_persisting() {
        let (controller, _) = controller(source_returning(10), sink_expecting(0, false));
        controller.start("Rust", "Ownership").await.unwrap();

        controller.dispose().await;

        assert!(!controller.has_countdown().await);
        assert_eq!(controller.phase().await, SessionPhase::Active);
    }

    #[tokio::test]
    async fn rapid_double_next_commits_each_question_once() {
        let (controller, clock) = controller(source_returning(10), sink_expecting(0, false));
        controller.start("Rust", "Ownership").await.unwrap();

        clock.advance(0.4);
        let (first, second) = tokio::join!(controller.next(), controller.next());
        clock.advance(0.6);
        controller.previous().await;

        assert!(first.is_none() && second.is_none());
        let state = controller.state.lock().await;
        let times = state.session.time_per_question();
        assert_eq!(state.session.current_index(), 1);
        assert_eq!(times.get(&0), Some(&0.4));
        assert_eq!(times.get(&1), Some(&0.0));
        assert_eq!(times.get(&2), Some(&0.6));
        assert_eq!(times.len(), 3);
    }

    #[tokio::test]
    async fn finish_records_when_it_happened() {
        let (controller, _) = controller(source_returning(10), sink_expecting(1, false));
        controller.start("Rust", "Ownership").await.unwrap();
        assert!(controller.finished_at().await.is_none());

        controller.finish().await.unwrap();

        assert!(controller.finished_at().await.is_some());
        assert!(format!("{:?}", controller).contains("user-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_without_activity_is_not_persisted() {
        let (controller, _) = controller(source_returning(10), sink_expecting(0, false));
        controller.start("Rust", "Ownership").await.unwrap();

        tokio::time::sleep(Duration::from_secs(601)).await;

        assert_eq!(controller.phase().await, SessionPhase::Finished);
        assert!(controller.finished_at().await.is_some());
        assert!(!controller.has_countdown().await);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_while_polled_is_persisted() {
        let (controller, _) = controller(source_returning(10), sink_expecting(1, false));
        controller.start("Rust", "Ownership").await.unwrap();

        for _ in 0..20 {
            tokio::time::sleep(Duration::from_secs(31)).await;
            controller.snapshot().await;
        }

        assert_eq!(controller.phase().await, SessionPhase::Finished);
        assert!(controller.result().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_once_per_second() {
        let (controller, _) = controller(source_returning(10), sink_expecting(0, false));
        controller.start("Rust", "Ownership").await.unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(controller.time_remaining().await, 597);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use crate::{
    clock::Clock,
    errors::{AppError, AppResult},
    models::domain::{
        question::{OPTIONS_PER_QUESTION, QUESTIONS_PER_QUIZ},
        Question, QuizResult,
    },
};

pub const QUIZ_TIME_LIMIT_SECONDS: u32 = 600;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Loading,
    Active,
    Finished,
}

/// State of one timed attempt. Every mutating operation is a no-op outside `Active`.
pub struct QuizSession {
    course_id: String,
    phase: SessionPhase,
    questions: Vec<Question>,
    answers: BTreeMap<usize, usize>,
    current_index: usize,
    visited: BTreeSet<usize>,
    time_per_question: BTreeMap<usize, f64>,
    time_remaining: u32,
    session_start: Option<DateTime<Utc>>,
    active_question_start: Option<DateTime<Utc>>,
    result: Option<QuizResult>,
    clock: Arc<dyn Clock>,
}

impl QuizSession {
    pub fn new(course_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            course_id: course_id.into(),
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            answers: BTreeMap::new(),
            current_index: 0,
            visited: BTreeSet::from([0]),
            time_per_question: BTreeMap::new(),
            time_remaining: QUIZ_TIME_LIMIT_SECONDS,
            session_start: None,
            active_question_start: None,
            result: None,
            clock,
        }
    }

    /// Loads the fetched questions and starts the clocks. A wrong question count or a
    /// malformed question leaves the session in `Loading`.
    pub fn activate(&mut self, questions: Vec<Question>) -> AppResult<()> {
        if self.phase != SessionPhase::Loading {
            return Err(AppError::InternalError(
                "Quiz session has already been started".to_string(),
            ));
        }

        if questions.len() != QUESTIONS_PER_QUIZ {
            return Err(AppError::QuestionSource(format!(
                "Expected {} questions, received {}",
                QUESTIONS_PER_QUIZ,
                questions.len()
            )));
        }

        for (index, question) in questions.iter().enumerate() {
            question.validate().map_err(|e| {
                AppError::QuestionSource(format!("Question {} is malformed: {}", index + 1, e))
            })?;
        }

        let now = self.clock.now();
        self.questions = questions;
        self.answers.clear();
        self.current_index = 0;
        self.visited = BTreeSet::from([0]);
        self.time_per_question.clear();
        self.time_remaining = QUIZ_TIME_LIMIT_SECONDS;
        self.session_start = Some(now);
        self.active_question_start = Some(now);
        self.phase = SessionPhase::Active;

        log::info!("Quiz session for course {} is active", self.course_id);
        Ok(())
    }

    /// Records (or overwrites) the answer for the current question.
    pub fn select_option(&mut self, option_index: usize) -> bool {
        if self.phase != SessionPhase::Active || option_index >= OPTIONS_PER_QUESTION {
            return false;
        }
        self.answers.insert(self.current_index, option_index);
        true
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        if self.phase != SessionPhase::Active
            || index >= self.questions.len()
            || index == self.current_index
        {
            return false;
        }

        let now = self.clock.now();
        self.commit_active_time(now);
        self.current_index = index;
        self.visited.insert(index);
        self.active_question_start = Some(now);
        true
    }

    /// Moves forward; on the last question this submits the quiz instead.
    pub fn next(&mut self) -> Option<QuizResult> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        if self.is_on_last_question() {
            return self.finish();
        }
        self.go_to(self.current_index + 1);
        None
    }

    pub fn previous(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.go_to(self.current_index - 1)
    }

    /// Scores the attempt and freezes it. Only the first call while `Active` yields a result.
    pub fn finish(&mut self) -> Option<QuizResult> {
        if self.phase != SessionPhase::Active {
            return None;
        }

        let now = self.clock.now();
        self.commit_active_time(now);
        self.active_question_start = None;

        let time_taken = self
            .session_start
            .map(|start| (now - start).num_seconds().max(0))
            .unwrap_or(0);

        let result = QuizResult {
            course_id: self.course_id.clone(),
            score: self.score(),
            time_taken,
            completed_at: now,
            time_per_question: self
                .time_per_question
                .iter()
                .map(|(index, seconds)| (index.to_string(), *seconds))
                .collect(),
        };

        self.phase = SessionPhase::Finished;
        self.result = Some(result.clone());

        log::info!(
            "Quiz session for course {} finished with score {}/{} in {}s",
            self.course_id,
            result.score,
            self.questions.len(),
            result.time_taken
        );
        Some(result)
    }

    /// One second of countdown. Returns the result when the time limit forces a finish.
    pub fn tick(&mut self) -> Option<QuizResult> {
        if self.phase != SessionPhase::Active {
            return None;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            log::info!("Time limit reached for course {}", self.course_id);
            return self.finish();
        }
        None
    }

    /// Correct answers; unanswered questions count as incorrect.
    pub fn score(&self) -> i32 {
        self.questions
            .iter()
            .enumerate()
            .filter(|(index, question)| {
                self.answers
                    .get(index)
                    .is_some_and(|answer| question.is_correct(*answer))
            })
            .count() as i32
    }

    /// Seconds on the current question not yet committed to `time_per_question`.
    pub fn live_question_time(&self) -> f64 {
        match (self.phase, self.active_question_start) {
            (SessionPhase::Active, Some(start)) => seconds_between(start, self.clock.now()),
            _ => 0.0,
        }
    }

    fn commit_active_time(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.active_question_start {
            *self
                .time_per_question
                .entry(self.current_index)
                .or_insert(0.0) += seconds_between(start, now);
        }
    }

    fn is_on_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(&index).copied()
    }

    pub fn visited(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    pub fn time_per_question(&self) -> &BTreeMap<usize, f64> {
        &self.time_per_question
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds().max(0) as f64 / 1000.0
}

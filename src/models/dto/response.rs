use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    errors::ResultPersistenceWarning,
    models::domain::QuizResult,
    services::quiz_session::{QuizSession, SessionPhase},
};

/// Formats seconds as `MM:SS`.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// The question being shown. The correct option is withheld until the attempt is over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    /// Seconds spent on this question so far, across visits.
    pub time_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReview {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    pub correct_option_index: usize,
    pub answered: bool,
    pub is_correct: bool,
    pub explanation: String,
    /// Rounded to whole seconds.
    pub time_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResultView {
    pub course_id: String,
    pub score: i32,
    pub total_questions: usize,
    pub time_taken: i64,
    pub time_taken_display: String,
    pub completed_at: DateTime<Utc>,
    pub review: Vec<QuestionReview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSessionView {
    pub session_id: Uuid,
    pub course_id: String,
    pub phase: SessionPhase,
    pub question_count: usize,
    pub current_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    pub answers: BTreeMap<usize, usize>,
    pub visited: Vec<usize>,
    pub time_remaining: u32,
    pub time_remaining_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<QuizResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<String>,
}

impl QuizSessionView {
    pub fn build(
        session_id: Uuid,
        session: &QuizSession,
        warning: Option<&ResultPersistenceWarning>,
    ) -> Self {
        let current_question = match session.phase() {
            SessionPhase::Active => session.current_question().map(|question| {
                let index = session.current_index();
                let committed = session.time_per_question().get(&index).copied().unwrap_or(0.0);

                QuestionView {
                    index,
                    text: question.text.clone(),
                    options: question.options.to_vec(),
                    selected_option: session.answer_for(index),
                    time_seconds: (committed + session.live_question_time()).round() as i64,
                }
            }),
            _ => None,
        };

        QuizSessionView {
            session_id,
            course_id: session.course_id().to_string(),
            phase: session.phase(),
            question_count: session.questions().len(),
            current_index: session.current_index(),
            current_question,
            answers: session.answers().clone(),
            visited: session.visited().iter().copied().collect(),
            time_remaining: session.time_remaining(),
            time_remaining_display: format_clock(session.time_remaining() as i64),
            result: session
                .result()
                .map(|result| QuizResultView::build(session, result)),
            persistence_warning: warning.map(|w| w.to_string()),
        }
    }
}

impl QuizResultView {
    fn build(session: &QuizSession, result: &QuizResult) -> Self {
        let review = session
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let selected_option = session.answer_for(index);
                QuestionReview {
                    index,
                    text: question.text.clone(),
                    options: question.options.to_vec(),
                    selected_option,
                    correct_option_index: question.correct_option_index,
                    answered: selected_option.is_some(),
                    is_correct: selected_option.is_some_and(|answer| question.is_correct(answer)),
                    explanation: question.explanation.clone(),
                    time_seconds: result.time_for(index).round() as i64,
                }
            })
            .collect();

        QuizResultView {
            course_id: result.course_id.clone(),
            score: result.score,
            total_questions: session.questions().len(),
            time_taken: result.time_taken,
            time_taken_display: format_clock(result.time_taken),
            completed_at: result.completed_at,
            review,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizHistoryResponse {
    pub results: Vec<QuizResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, test_utils::fixtures::sample_questions};
    use std::sync::Arc;

    #[test]
    fn format_clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(-3), "00:00");
    }

    #[test]
    fn active_view_hides_answer_key() {
        let mut session = QuizSession::new("rust-101", Arc::new(ManualClock::default()));
        session.activate(sample_questions(10)).unwrap();
        session.select_option(3);

        let view = QuizSessionView::build(Uuid::new_v4(), &session, None);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(view.phase, SessionPhase::Active);
        assert_eq!(view.current_question.as_ref().unwrap().selected_option, Some(3));
        assert!(view.result.is_none());
        assert!(json["current_question"].get("correct_option_index").is_none());
        assert_eq!(json["time_remaining_display"], "10:00");
    }

    #[test]
    fn active_view_counts_time_across_visits() {
        let clock = Arc::new(ManualClock::default());
        let mut session = QuizSession::new("rust-101", clock.clone());
        session.activate(sample_questions(10)).unwrap();
        clock.advance(4.0);
        session.go_to(1);
        clock.advance(9.0);
        session.go_to(0);
        clock.advance(2.6);

        let view = QuizSessionView::build(Uuid::new_v4(), &session, None);

        assert_eq!(view.current_question.unwrap().time_seconds, 7);
    }

    #[test]
    fn finished_view_contains_review_and_warning() {
        let clock = Arc::new(ManualClock::default());
        let mut session = QuizSession::new("rust-101", clock.clone());
        session.activate(sample_questions(10)).unwrap();
        session.select_option(0);
        clock.advance(4.6);
        session.go_to(1);
        session.select_option(0);
        clock.advance(70.0);
        session.finish();

        let warning = ResultPersistenceWarning("write rejected".to_string());
        let view = QuizSessionView::build(Uuid::new_v4(), &session, Some(&warning));
        let result = view.result.expect("finished session has a result");

        assert!(view.current_question.is_none());
        assert_eq!(result.score, 1);
        assert_eq!(result.total_questions, 10);
        assert_eq!(result.time_taken_display, "01:14");
        assert!(result.review[0].is_correct);
        assert!(result.review[1].answered && !result.review[1].is_correct);
        assert!(!result.review[2].answered);
        assert_eq!(result.review[0].time_seconds, 5);
        assert_eq!(result.review[1].time_seconds, 70);
        assert!(view.persistence_warning.unwrap().contains("write rejected"));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one finished attempt. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizResult {
    pub course_id: String,
    pub score: i32,
    /// Whole seconds from session start to finish.
    pub time_taken: i64,
    pub completed_at: DateTime<Utc>,
    /// Seconds spent per question, keyed by the question index as a decimal string.
    pub time_per_question: BTreeMap<String, f64>,
}

impl QuizResult {
    pub fn time_for(&self, question_index: usize) -> f64 {
        self.time_per_question
            .get(&question_index.to_string())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn total_question_time(&self) -> f64 {
        self.time_per_question.values().sum()
    }
}

/// Stored shape: one document per (user, course); a retake replaces it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizResultRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub result: QuizResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result() -> QuizResult {
        let mut time_per_question = BTreeMap::new();
        time_per_question.insert("0".to_string(), 8.0);
        time_per_question.insert("1".to_string(), 10.0);

        QuizResult {
            course_id: "rust-101".to_string(),
            score: 7,
            time_taken: 18,
            completed_at: Utc::now(),
            time_per_question,
        }
    }

    #[test]
    fn time_for_missing_question_is_zero() {
        let result = make_result();

        assert_eq!(result.time_for(0), 8.0);
        assert_eq!(result.time_for(9), 0.0);
        assert_eq!(result.total_question_time(), 18.0);
    }

    #[test]
    fn record_flattens_result_fields() {
        let record = QuizResultRecord {
            user_id: "user-1".to_string(),
            result: make_result(),
        };

        let json = serde_json::to_value(&record).expect("record should serialize");

        assert_eq!(json["user_id"], "user-1");
        assert_eq!(json["course_id"], "rust-101");
        assert_eq!(json["score"], 7);
        assert_eq!(json["time_per_question"]["1"], 10.0);
    }
}

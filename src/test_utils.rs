use crate::models::domain::{Course, Question};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// `count` valid questions; question `i` has correct option `i % 4`.
    pub fn sample_questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| Question {
                text: format!("Question {}", i + 1),
                options: [
                    format!("Option A{}", i),
                    format!("Option B{}", i),
                    format!("Option C{}", i),
                    format!("Option D{}", i),
                ],
                correct_option_index: i % 4,
                explanation: format!("Explanation {}", i + 1),
            })
            .collect()
    }

    pub fn test_course() -> Course {
        Course::new(
            "rust-101",
            "Rust Fundamentals",
            "Ownership, borrowing and lifetimes",
        )
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_sample_questions() {
        let questions = sample_questions(10);

        assert_eq!(questions.len(), 10);
        assert!(questions.iter().all(|q| q.validate().is_ok()));
        assert_eq!(questions[5].correct_option_index, 1);
    }

    #[test]
    fn test_fixtures_test_course() {
        let course = test_course();
        assert_eq!(course.id, "rust-101");
        assert!(!course.title.is_empty());
    }
}

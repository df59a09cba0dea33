use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub const OPTIONS_PER_QUESTION: usize = 4;
pub const QUESTIONS_PER_QUIZ: usize = 10;

/// A multiple-choice question. An option's identity is its index.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub text: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    pub correct_option_index: usize,
    pub explanation: String,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: [String; OPTIONS_PER_QUESTION],
        correct_option_index: usize,
        explanation: impl Into<String>,
    ) -> AppResult<Self> {
        let question = Question {
            text: text.into(),
            options,
            correct_option_index,
            explanation: explanation.into(),
        };
        question.validate()?;
        Ok(question)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.text.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Question text must not be empty".to_string(),
            ));
        }
        if self.correct_option_index >= OPTIONS_PER_QUESTION {
            return Err(AppError::ValidationError(format!(
                "Correct option index {} is out of range",
                self.correct_option_index
            )));
        }
        Ok(())
    }

    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_option_index
    }
}

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StartQuizSessionRequest {
    #[validate(length(min = 1, max = 200))]
    pub course_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SelectOptionRequest {
    #[validate(range(max = 3, message = "Option index must be between 0 and 3"))]
    pub option_index: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NavigateRequest {
    #[validate(range(max = 9, message = "Question index must be between 0 and 9"))]
    pub index: usize,
}

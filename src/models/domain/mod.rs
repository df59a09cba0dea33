pub mod course;
pub mod question;
pub mod quiz_result;
pub use course::Course;
pub use question::Question;
pub use quiz_result::{QuizResult, QuizResultRecord};

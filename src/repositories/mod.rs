pub mod course_repository;
pub mod quiz_result_repository;

pub use course_repository::{CourseRepository, MongoCourseRepository};
pub use quiz_result_repository::{MongoQuizResultRepository, QuizResultRepository};

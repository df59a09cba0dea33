#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use skillbridge_quiz::{
    errors::{AppError, AppResult},
    models::domain::{Course, Question, QuizResult},
    repositories::{CourseRepository, QuizResultRepository},
    services::question_source::QuestionSource,
};

/// `count` valid questions; question `i` has correct option `i % 4`.
pub fn sample_questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| Question {
            text: format!("What does snippet {} print?", i + 1),
            options: [
                format!("{}", i),
                format!("{}", i + 1),
                format!("{}", i + 2),
                "It does not compile".to_string(),
            ],
            correct_option_index: i % 4,
            explanation: format!("Snippet {} explained", i + 1),
        })
        .collect()
}

pub fn rust_course() -> Course {
    Course::new(
        "rust-101",
        "Rust Fundamentals",
        "Ownership, borrowing and lifetimes",
    )
}

pub struct InMemoryCourseRepository {
    courses: HashMap<String, Course>,
}

impl InMemoryCourseRepository {
    pub fn with(courses: Vec<Course>) -> Self {
        Self {
            courses: courses.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Course>> {
        Ok(self.courses.get(id).cloned())
    }
}

/// Keeps one result per (user, course), like the unique index on the real collection.
#[derive(Default)]
pub struct InMemoryQuizResultRepository {
    results: RwLock<HashMap<(String, String), QuizResult>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryQuizResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryQuizResultRepository {
    async fn save(&self, user_id: &str, result: QuizResult) -> AppResult<QuizResult> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("connection reset".to_string()));
        }

        self.results.write().await.insert(
            (user_id.to_string(), result.course_id.clone()),
            result.clone(),
        );
        Ok(result)
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizResult>> {
        let results = self.results.read().await;
        let mut items: Vec<_> = results
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, result)| result.clone())
            .collect();
        items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(items)
    }

    async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Option<QuizResult>> {
        let results = self.results.read().await;
        Ok(results
            .get(&(user_id.to_string(), course_id.to_string()))
            .cloned())
    }
}

/// Returns a fixed number of questions, or fails when `fail` is set.
pub struct StubQuestionSource {
    count: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl StubQuestionSource {
    pub fn returning(count: usize) -> Self {
        Self {
            count,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            count: 0,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for StubQuestionSource {
    async fn generate_quiz(
        &self,
        _course_title: &str,
        _course_description: &str,
    ) -> AppResult<Vec<Question>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::QuestionSource("model unavailable".to_string()));
        }
        Ok(sample_questions(self.count))
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}

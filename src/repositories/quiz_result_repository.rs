use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{QuizResult, QuizResultRecord},
};

/// Stores one result per (user, course). Saving again for the same pair replaces it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    async fn save(&self, user_id: &str, result: QuizResult) -> AppResult<QuizResult>;
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizResult>>;
    async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Option<QuizResult>>;
}

pub struct MongoQuizResultRepository {
    collection: Collection<QuizResultRecord>,
}

impl MongoQuizResultRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_results collection");

        let user_course_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_course_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(user_course_index).await?;

        log::info!("Successfully created indexes for quiz_results collection");
        Ok(())
    }
}

#[async_trait]
impl QuizResultRepository for MongoQuizResultRepository {
    async fn save(&self, user_id: &str, result: QuizResult) -> AppResult<QuizResult> {
        let filter = doc! { "user_id": user_id, "course_id": &result.course_id };
        let options = ReplaceOptions::builder().upsert(true).build();
        let record = QuizResultRecord {
            user_id: user_id.to_string(),
            result,
        };

        self.collection
            .replace_one(filter, &record)
            .with_options(options)
            .await?;

        Ok(record.result)
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizResult>> {
        let records: Vec<QuizResultRecord> = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "completed_at": -1 })
            .await?
            .try_collect()
            .await?;

        Ok(records.into_iter().map(|record| record.result).collect())
    }

    async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Option<QuizResult>> {
        let record = self
            .collection
            .find_one(doc! { "user_id": user_id, "course_id": course_id })
            .await?;

        Ok(record.map(|record| record.result))
    }
}

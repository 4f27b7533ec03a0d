use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{Database, QUIZ_ANSWERS, QUIZ_ATTEMPTS},
    errors::AppResult,
    models::domain::{AttemptAnswer, QuizAttempt},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Stores a finished attempt and returns its id.
    async fn create_attempt(&self, attempt: QuizAttempt) -> AppResult<String>;
    async fn create_answers(&self, attempt_id: &str, answers: Vec<AttemptAnswer>) -> AppResult<()>;
    async fn delete_attempt(&self, attempt_id: &str) -> AppResult<()>;
    /// Most recent first.
    async fn list_attempts_for_user(&self, user_id: &str, quiz_id: &str) -> AppResult<Vec<QuizAttempt>>;
}

pub struct MongoAttemptRepository {
    attempts: Collection<QuizAttempt>,
    answers: Collection<AttemptAnswer>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            attempts: db.collection(QUIZ_ATTEMPTS),
            answers: db.collection(QUIZ_ANSWERS),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts and quiz_answers collections");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_quiz_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_quiz".to_string())
                    .build(),
            )
            .build();

        let answer_attempt_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1, "question_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_question_unique".to_string())
                    .build(),
            )
            .build();

        self.attempts.create_index(id_index).await?;
        self.attempts.create_index(user_quiz_index).await?;
        self.answers.create_index(answer_attempt_index).await?;

        log::info!("Successfully created indexes for attempt collections");
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create_attempt(&self, attempt: QuizAttempt) -> AppResult<String> {
        self.attempts.insert_one(&attempt).await?;
        Ok(attempt.id)
    }

    async fn create_answers(&self, attempt_id: &str, answers: Vec<AttemptAnswer>) -> AppResult<()> {
        if answers.is_empty() {
            return Ok(());
        }
        let answers: Vec<AttemptAnswer> = answers
            .into_iter()
            .map(|mut a| {
                a.attempt_id = attempt_id.to_string();
                a
            })
            .collect();
        self.answers.insert_many(&answers).await?;
        Ok(())
    }

    async fn delete_attempt(&self, attempt_id: &str) -> AppResult<()> {
        self.answers.delete_many(doc! { "attempt_id": attempt_id }).await?;
        self.attempts.delete_one(doc! { "id": attempt_id }).await?;
        Ok(())
    }

    async fn list_attempts_for_user(&self, user_id: &str, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .attempts
            .find(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .sort(doc! { "completed_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }
}

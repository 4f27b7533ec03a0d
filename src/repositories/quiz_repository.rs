use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{Database, QUIZZES, QUIZ_QUESTIONS},
    errors::AppResult,
    models::domain::{Quiz, QuizQuestion, QuizWithQuestions},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create_quiz(&self, quiz: Quiz) -> AppResult<Quiz>;
    /// Inserts every question of a quiz in one call.
    async fn create_questions(&self, quiz_id: &str, questions: Vec<QuizQuestion>) -> AppResult<()>;
    async fn find_quiz_with_questions(&self, quiz_id: &str) -> AppResult<Option<QuizWithQuestions>>;
    async fn list_quizzes_for_file(&self, file_id: &str) -> AppResult<Vec<Quiz>>;
    /// Removes a quiz and any questions stored under it.
    async fn delete_quiz(&self, quiz_id: &str) -> AppResult<()>;
}

pub struct MongoQuizRepository {
    quizzes: Collection<Quiz>,
    questions: Collection<QuizQuestion>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            quizzes: db.collection(QUIZZES),
            questions: db.collection(QUIZ_QUESTIONS),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes and quiz_questions collections");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let source_file_index = IndexModel::builder()
            .keys(doc! { "source_file_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("source_file".to_string())
                    .build(),
            )
            .build();

        let question_quiz_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "position": 1 })
            .options(
                IndexOptions::builder()
                    .name("quiz_position".to_string())
                    .build(),
            )
            .build();

        self.quizzes.create_index(id_index).await?;
        self.quizzes.create_index(source_file_index).await?;
        self.questions.create_index(question_quiz_index).await?;

        log::info!("Successfully created indexes for quiz collections");
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create_quiz(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.quizzes.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn create_questions(&self, quiz_id: &str, questions: Vec<QuizQuestion>) -> AppResult<()> {
        if questions.is_empty() {
            return Ok(());
        }
        let count = questions.len();
        self.questions.insert_many(&questions).await?;
        log::debug!("Stored {} questions for quiz {}", count, quiz_id);
        Ok(())
    }

    async fn find_quiz_with_questions(&self, quiz_id: &str) -> AppResult<Option<QuizWithQuestions>> {
        let Some(quiz) = self.quizzes.find_one(doc! { "id": quiz_id }).await? else {
            return Ok(None);
        };

        let questions: Vec<QuizQuestion> = self
            .questions
            .find(doc! { "quiz_id": quiz_id })
            .sort(doc! { "position": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(Some(QuizWithQuestions { quiz, questions }))
    }

    async fn list_quizzes_for_file(&self, file_id: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self
            .quizzes
            .find(doc! { "source_file_id": file_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }

    async fn delete_quiz(&self, quiz_id: &str) -> AppResult<()> {
        self.questions.delete_many(doc! { "quiz_id": quiz_id }).await?;
        self.quizzes.delete_one(doc! { "id": quiz_id }).await?;
        Ok(())
    }
}

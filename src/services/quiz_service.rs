use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{source_document::DocumentContent, Quiz, QuizSettings, QuizWithQuestions},
    repositories::{DocumentSource, QuizRepository},
    services::{
        db_helpers::with_timeout,
        notifier::{Notice, Notifier},
        question_editor::QuestionEditor,
        question_generator::generate_questions,
    },
};

/// Everything the authoring form holds before it is submitted.
#[derive(Clone, Debug, Serialize)]
pub struct AuthoringForm {
    pub owner_id: String,
    pub source_file_id: String,
    pub settings: QuizSettings,
    pub editor: QuestionEditor,
}

impl AuthoringForm {
    pub fn new(owner_id: &str, source_file_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            source_file_id: source_file_id.to_string(),
            settings: QuizSettings::default(),
            editor: QuestionEditor::new(),
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.settings.title.trim().is_empty() {
            return Err(AppError::ValidationError("quiz title is required".to_string()));
        }
        if self.source_file_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "a quiz must be linked to a source document".to_string(),
            ));
        }
        if self.settings.time_limit_minutes == Some(0) {
            return Err(AppError::ValidationError(
                "time limit must be a positive number of minutes".to_string(),
            ));
        }
        self.editor.validate_all()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmitOutcome {
    pub quiz: Quiz,
    pub question_count: usize,
    pub message: String,
}

pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
    documents: Arc<dyn DocumentSource>,
    notifier: Arc<dyn Notifier>,
    store_timeout: Duration,
    listing_cache: RwLock<HashMap<String, Vec<Quiz>>>,
}

impl QuizService {
    pub fn new(
        repository: Arc<dyn QuizRepository>,
        documents: Arc<dyn DocumentSource>,
        notifier: Arc<dyn Notifier>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            documents,
            notifier,
            store_timeout,
            listing_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Validates the form and stores the quiz with all of its questions.
    /// A quiz whose questions fail to store is deleted again, so callers
    /// never see half a quiz.
    pub async fn submit(&self, form: &AuthoringForm, is_draft: bool) -> AppResult<SubmitOutcome> {
        if let Err(e) = form.validate() {
            self.notifier.notify(&form.owner_id, Notice::Error(e.to_string()));
            return Err(e);
        }

        let quiz = Quiz::new(&form.settings, &form.source_file_id, &form.owner_id);
        let questions = form.editor.to_quiz_questions(&quiz.id);
        let question_count = questions.len();

        let quiz = match with_timeout(self.store_timeout, self.repository.create_quiz(quiz)).await {
            Ok(quiz) => quiz,
            Err(e) => {
                log::error!("Failed to create quiz '{}': {}", form.settings.title, e);
                self.notifier
                    .notify(&form.owner_id, Notice::Error(format!("Failed to save quiz: {}", e)));
                return Err(e);
            }
        };

        let stored = with_timeout(
            self.store_timeout,
            self.repository.create_questions(&quiz.id, questions),
        )
        .await;

        if let Err(e) = stored {
            log::error!("Failed to store questions for quiz {}: {}", quiz.id, e);
            let cleanup = with_timeout(self.store_timeout, self.repository.delete_quiz(&quiz.id));
            if let Err(cleanup) = cleanup.await {
                log::error!("Orphaned quiz {} could not be removed: {}", quiz.id, cleanup);
            }
            self.notifier
                .notify(&form.owner_id, Notice::Error(format!("Failed to save quiz: {}", e)));
            return Err(e);
        }

        self.invalidate_listing(&form.source_file_id).await;

        let message = if is_draft {
            "Quiz saved as draft".to_string()
        } else {
            "Quiz created successfully".to_string()
        };
        log::info!(
            "Quiz {} created by {} with {} questions",
            quiz.id,
            quiz.owner_id,
            question_count
        );
        self.notifier
            .notify(&form.owner_id, Notice::Success(message.clone()));

        Ok(SubmitOutcome {
            quiz,
            question_count,
            message,
        })
    }

    pub async fn get_quiz_with_questions(&self, quiz_id: &str) -> AppResult<QuizWithQuestions> {
        with_timeout(
            self.store_timeout,
            self.repository.find_quiz_with_questions(quiz_id),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    pub async fn list_quizzes_for_file(&self, file_id: &str) -> AppResult<Vec<Quiz>> {
        if let Some(cached) = self.listing_cache.read().await.get(file_id) {
            return Ok(cached.clone());
        }

        let quizzes = with_timeout(
            self.store_timeout,
            self.repository.list_quizzes_for_file(file_id),
        )
        .await?;

        self.listing_cache
            .write()
            .await
            .insert(file_id.to_string(), quizzes.clone());
        Ok(quizzes)
    }

    /// Builds an editor pre-filled with questions generated from the file's text.
    pub async fn generate_editor(&self, user_id: &str, file_id: &str) -> AppResult<QuestionEditor> {
        let result = self.generate_editor_inner(file_id).await;
        if let Err(e) = &result {
            self.notifier.notify(user_id, Notice::Error(e.to_string()));
        }
        result
    }

    async fn generate_editor_inner(&self, file_id: &str) -> AppResult<QuestionEditor> {
        let content = with_timeout(self.store_timeout, self.documents.fetch_content(file_id)).await?;

        let text = match content {
            DocumentContent::Usable(text) => text,
            DocumentContent::TooShort { length } => {
                return Err(AppError::GenerationError(format!(
                    "document is too short to generate questions ({} characters)",
                    length
                )));
            }
        };

        let generated = generate_questions(&text);
        if generated.is_empty() {
            return Err(AppError::GenerationError(
                "no paragraphs were long enough to generate questions; add them manually"
                    .to_string(),
            ));
        }

        log::info!("Generated {} questions from document {}", generated.len(), file_id);
        Ok(QuestionEditor::from_generated(generated))
    }

    async fn invalidate_listing(&self, file_id: &str) {
        self.listing_cache.write().await.remove(file_id);
    }
}

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use dcghub_quiz::{
    app_state::AppState,
    errors::{AppError, AppResult},
    models::domain::{
        source_document::DocumentContent, AttemptAnswer, Quiz, QuizAttempt, QuizQuestion,
        QuizWithQuestions, SourceDocument,
    },
    repositories::{AttemptRepository, DocumentSource, QuizRepository},
    services::notifier::{Notice, Notifier},
};

/// How long a stalled delete hangs; far beyond any store timeout.
pub const STALL: Duration = Duration::from_secs(3600);

#[derive(Default)]
pub struct InMemoryQuizRepository {
    pub quizzes: RwLock<HashMap<String, Quiz>>,
    pub questions: RwLock<HashMap<String, Vec<QuizQuestion>>>,
    pub fail_questions: AtomicBool,
    pub stall_deletes: AtomicBool,
}

impl InMemoryQuizRepository {
    pub async fn quiz_count(&self) -> usize {
        self.quizzes.read().await.len()
    }

    pub async fn insert(&self, data: QuizWithQuestions) {
        self.questions
            .write()
            .await
            .insert(data.quiz.id.clone(), data.questions);
        self.quizzes.write().await.insert(data.quiz.id.clone(), data.quiz);
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn create_quiz(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.quizzes
            .write()
            .await
            .insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn create_questions(&self, quiz_id: &str, questions: Vec<QuizQuestion>) -> AppResult<()> {
        if self.fail_questions.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceError("question insert rejected".to_string()));
        }
        self.questions
            .write()
            .await
            .entry(quiz_id.to_string())
            .or_default()
            .extend(questions);
        Ok(())
    }

    async fn find_quiz_with_questions(&self, quiz_id: &str) -> AppResult<Option<QuizWithQuestions>> {
        let Some(quiz) = self.quizzes.read().await.get(quiz_id).cloned() else {
            return Ok(None);
        };
        let mut questions = self
            .questions
            .read()
            .await
            .get(quiz_id)
            .cloned()
            .unwrap_or_default();
        questions.sort_by_key(|q| q.position);
        Ok(Some(QuizWithQuestions { quiz, questions }))
    }

    async fn list_quizzes_for_file(&self, file_id: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let mut items: Vec<_> = quizzes
            .values()
            .filter(|q| q.source_file_id.as_deref() == Some(file_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn delete_quiz(&self, quiz_id: &str) -> AppResult<()> {
        if self.stall_deletes.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
        self.quizzes.write().await.remove(quiz_id);
        self.questions.write().await.remove(quiz_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAttemptRepository {
    pub attempts: RwLock<HashMap<String, QuizAttempt>>,
    pub answers: RwLock<HashMap<String, Vec<AttemptAnswer>>>,
    pub fail_attempts: AtomicBool,
    pub fail_answers: AtomicBool,
    pub stall_deletes: AtomicBool,
}

impl InMemoryAttemptRepository {
    pub async fn attempt_count(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create_attempt(&self, attempt: QuizAttempt) -> AppResult<String> {
        if self.fail_attempts.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceError("attempt insert rejected".to_string()));
        }
        let id = attempt.id.clone();
        self.attempts.write().await.insert(id.clone(), attempt);
        Ok(id)
    }

    async fn create_answers(&self, attempt_id: &str, answers: Vec<AttemptAnswer>) -> AppResult<()> {
        if self.fail_answers.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceError("answer insert rejected".to_string()));
        }
        self.answers
            .write()
            .await
            .insert(attempt_id.to_string(), answers);
        Ok(())
    }

    async fn delete_attempt(&self, attempt_id: &str) -> AppResult<()> {
        if self.stall_deletes.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
        self.attempts.write().await.remove(attempt_id);
        self.answers.write().await.remove(attempt_id);
        Ok(())
    }

    async fn list_attempts_for_user(&self, user_id: &str, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(items)
    }
}

#[derive(Default)]
pub struct InMemoryDocuments {
    pub documents: RwLock<HashMap<String, String>>,
}

impl InMemoryDocuments {
    pub async fn put(&self, id: &str, content: &str) {
        self.documents
            .write()
            .await
            .insert(id.to_string(), content.to_string());
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocuments {
    async fn fetch_content(&self, file_id: &str) -> AppResult<DocumentContent> {
        let content = self
            .documents
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Document '{}' not found", file_id)))?;

        let document = SourceDocument {
            id: file_id.to_string(),
            name: format!("{}.txt", file_id),
            content,
            created_at: None,
        };
        Ok(document.into_content())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<(String, Notice)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.iter().map(|(_, notice)| notice.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|n| matches!(n, Notice::Error(m) if m.contains(needle)))
    }

    pub fn has_success(&self, message: &str) -> bool {
        self.messages()
            .iter()
            .any(|n| matches!(n, Notice::Success(m) if m == message))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, user_id: &str, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push((user_id.to_string(), notice));
        }
    }
}

pub struct Harness {
    pub quizzes: Arc<InMemoryQuizRepository>,
    pub attempts: Arc<InMemoryAttemptRepository>,
    pub documents: Arc<InMemoryDocuments>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        let quizzes = Arc::new(InMemoryQuizRepository::default());
        let attempts = Arc::new(InMemoryAttemptRepository::default());
        let documents = Arc::new(InMemoryDocuments::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let state = AppState::from_parts(
            quizzes.clone(),
            attempts.clone(),
            documents.clone(),
            notifier.clone(),
            Duration::from_secs(2),
        );

        Self {
            quizzes,
            attempts,
            documents,
            notifier,
            state,
        }
    }
}

/// A paragraph long enough for the generator to turn into a question.
pub fn long_paragraph(topic: &str, detail: &str) -> String {
    format!(
        "{topic}. {detail}. The rest of this paragraph exists so that it is comfortably longer \
         than the minimum the generator needs before it will produce a question"
    )
}

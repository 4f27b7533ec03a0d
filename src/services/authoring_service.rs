use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::{domain::QuizSettings, dto::request::EditorCommand},
    services::{
        notifier::{Notice, Notifier},
        question_editor::QuestionEditor,
        quiz_service::{AuthoringForm, QuizService, SubmitOutcome},
        session_sweeper::IdleSessions,
    },
};

/// Snapshot of an authoring session returned to clients.
#[derive(Clone, Debug, Serialize)]
pub struct AuthoringView {
    pub session_id: String,
    #[serde(flatten)]
    pub form: AuthoringForm,
}

struct AuthoringSession {
    form: AuthoringForm,
    last_touched: Instant,
}

/// Holds in-progress authoring forms between requests.
pub struct AuthoringService {
    quiz_service: Arc<QuizService>,
    notifier: Arc<dyn Notifier>,
    sessions: RwLock<HashMap<String, AuthoringSession>>,
}

impl AuthoringService {
    pub fn new(quiz_service: Arc<QuizService>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            quiz_service,
            notifier,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn open(&self, owner_id: &str, source_file_id: &str) -> AppResult<AuthoringView> {
        if source_file_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "a quiz must be linked to a source document".to_string(),
            ));
        }

        let session_id = Uuid::new_v4().to_string();
        let form = AuthoringForm::new(owner_id, source_file_id);
        self.sessions.write().await.insert(
            session_id.clone(),
            AuthoringSession {
                form: form.clone(),
                last_touched: Instant::now(),
            },
        );

        log::debug!("Opened authoring session {} for {}", session_id, owner_id);
        Ok(AuthoringView { session_id, form })
    }

    pub async fn view(&self, session_id: &str, user_id: &str) -> AppResult<AuthoringView> {
        self.with_form(session_id, user_id, |_| Ok(())).await
    }

    pub async fn apply(
        &self,
        session_id: &str,
        user_id: &str,
        command: EditorCommand,
    ) -> AppResult<AuthoringView> {
        self.with_form(session_id, user_id, |form| {
            apply_command(&mut form.editor, command).map(|_| ())
        })
        .await
    }

    pub async fn update_settings(
        &self,
        session_id: &str,
        user_id: &str,
        settings: QuizSettings,
    ) -> AppResult<AuthoringView> {
        self.with_form(session_id, user_id, |form| {
            form.settings = settings;
            Ok(())
        })
        .await
    }

    /// Validates one question in place; nothing is written to the store.
    pub async fn save_question(
        &self,
        session_id: &str,
        user_id: &str,
        index: usize,
    ) -> AppResult<AuthoringView> {
        let result = self
            .with_form(session_id, user_id, |form| form.editor.validate_question(index))
            .await;

        match &result {
            Ok(_) => self
                .notifier
                .notify(user_id, Notice::Success(format!("Question {} saved", index + 1))),
            Err(e) => self.notifier.notify(user_id, Notice::Error(e.to_string())),
        }
        result
    }

    /// Replaces the question list with questions generated from the linked document.
    pub async fn generate(&self, session_id: &str, user_id: &str) -> AppResult<AuthoringView> {
        let file_id = self
            .view(session_id, user_id)
            .await?
            .form
            .source_file_id;

        let editor = self.quiz_service.generate_editor(user_id, &file_id).await?;
        let count = editor.len();

        let view = self
            .with_form(session_id, user_id, |form| {
                form.editor = editor;
                Ok(())
            })
            .await?;

        self.notifier.notify(
            user_id,
            Notice::Success(format!("Generated {} questions", count)),
        );
        Ok(view)
    }

    /// Stores the quiz. The session ends only when the store accepted it, so a
    /// failed submit can be corrected and sent again.
    pub async fn submit(
        &self,
        session_id: &str,
        user_id: &str,
        is_draft: bool,
    ) -> AppResult<SubmitOutcome> {
        let form = self.view(session_id, user_id).await?.form;

        let outcome = self.quiz_service.submit(&form, is_draft).await?;
        self.sessions.write().await.remove(session_id);
        Ok(outcome)
    }

    pub async fn discard(&self, session_id: &str, user_id: &str) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        owned_session(&mut sessions, session_id, user_id)?;
        sessions.remove(session_id);
        Ok(())
    }

    async fn with_form<F>(&self, session_id: &str, user_id: &str, edit: F) -> AppResult<AuthoringView>
    where
        F: FnOnce(&mut AuthoringForm) -> AppResult<()>,
    {
        let mut sessions = self.sessions.write().await;
        let session = owned_session(&mut sessions, session_id, user_id)?;

        edit(&mut session.form)?;
        Ok(AuthoringView {
            session_id: session_id.to_string(),
            form: session.form.clone(),
        })
    }
}

#[async_trait]
impl IdleSessions for AuthoringService {
    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_touched.elapsed() <= max_idle);
        before - sessions.len()
    }

    fn kind(&self) -> &'static str {
        "authoring"
    }
}

/// Applies one editor command. Returns the id of a newly added option, if any.
pub fn apply_command(editor: &mut QuestionEditor, command: EditorCommand) -> AppResult<Option<String>> {
    match command {
        EditorCommand::AddQuestion => {
            editor.add_question();
        }
        EditorCommand::RemoveQuestion { index } => editor.remove_question(index)?,
        EditorCommand::UpdateQuestionText { index, text } => {
            editor.update_question_text(index, &text)?
        }
        EditorCommand::UpdateExplanation { index, text } => editor.update_explanation(index, &text)?,
        EditorCommand::AddOption { index } => return editor.add_option(index).map(Some),
        EditorCommand::RemoveOption {
            index,
            option_index,
        } => editor.remove_option(index, option_index)?,
        EditorCommand::UpdateOption {
            index,
            option_index,
            value,
        } => editor.update_option(index, option_index, &value)?,
        EditorCommand::ToggleCorrectAnswer { index, option_id } => {
            editor.toggle_correct_answer(index, &option_id)?;
        }
    }
    Ok(None)
}

/// Looks up a session owned by `user_id` and marks it as just used.
fn owned_session<'a>(
    sessions: &'a mut HashMap<String, AuthoringSession>,
    session_id: &str,
    user_id: &str,
) -> AppResult<&'a mut AuthoringSession> {
    let session = sessions
        .get_mut(session_id)
        .ok_or_else(|| AppError::NotFound(format!("Authoring session '{}' not found", session_id)))?;
    if session.form.owner_id != user_id {
        return Err(AppError::Unauthorized(
            "authoring session belongs to another user".to_string(),
        ));
    }
    session.last_touched = Instant::now();
    Ok(session)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        repositories::{
            document_repository::MockDocumentSource, quiz_repository::MockQuizRepository,
        },
        services::notifier::MockNotifier,
    };

    fn service_with(repo: MockQuizRepository) -> AuthoringService {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);

        let quiz_service = QuizService::new(
            Arc::new(repo),
            Arc::new(MockDocumentSource::new()),
            notifier.clone(),
            Duration::from_secs(2),
        );
        AuthoringService::new(Arc::new(quiz_service), notifier)
    }

    async fn fill_first_question(svc: &AuthoringService, session_id: &str) -> AuthoringView {
        let commands = vec![
            EditorCommand::UpdateQuestionText {
                index: 0,
                text: "Capital of France?".to_string(),
            },
            EditorCommand::UpdateOption {
                index: 0,
                option_index: 0,
                value: "Paris".to_string(),
            },
            EditorCommand::UpdateOption {
                index: 0,
                option_index: 1,
                value: "Lyon".to_string(),
            },
            EditorCommand::UpdateOption {
                index: 0,
                option_index: 2,
                value: "Nice".to_string(),
            },
        ];
        for command in commands {
            svc.apply(session_id, "author-1", command).await.unwrap();
        }
        let view = svc.view(session_id, "author-1").await.unwrap();
        let paris = view.form.editor.questions()[0].options[0].id.clone();
        svc.apply(
            session_id,
            "author-1",
            EditorCommand::ToggleCorrectAnswer {
                index: 0,
                option_id: paris,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn open_requires_a_source_document() {
        let svc = service_with(MockQuizRepository::new());
        assert!(matches!(
            svc.open("author-1", " ").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn sessions_are_private_to_their_owner() {
        let svc = service_with(MockQuizRepository::new());
        let view = svc.open("author-1", "file-1").await.unwrap();

        assert!(matches!(
            svc.view(&view.session_id, "someone-else").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.discard(&view.session_id, "someone-else").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn correct_answer_survives_option_rewording() {
        let svc = service_with(MockQuizRepository::new());
        let session = svc.open("author-1", "file-1").await.unwrap().session_id;
        fill_first_question(&svc, &session).await;

        let view = svc
            .apply(
                &session,
                "author-1",
                EditorCommand::UpdateOption {
                    index: 0,
                    option_index: 0,
                    value: "Paris, France".to_string(),
                },
            )
            .await
            .unwrap();

        let questions = view.form.editor.to_quiz_questions("quiz-1");
        assert!(questions[0].correct_answers.contains("Paris, France"));
    }

    #[tokio::test]
    async fn save_question_reports_validation_problems() {
        let svc = service_with(MockQuizRepository::new());
        let session = svc.open("author-1", "file-1").await.unwrap().session_id;

        assert!(matches!(
            svc.save_question(&session, "author-1", 0).await,
            Err(AppError::ValidationError(_))
        ));

        fill_first_question(&svc, &session).await;
        assert!(svc.save_question(&session, "author-1", 0).await.is_ok());
    }

    #[tokio::test]
    async fn successful_submit_closes_the_session() {
        let mut repo = MockQuizRepository::new();
        repo.expect_create_quiz().returning(|quiz| Ok(quiz));
        repo.expect_create_questions().returning(|_, _| Ok(()));

        let svc = service_with(repo);
        let session = svc.open("author-1", "file-1").await.unwrap().session_id;
        fill_first_question(&svc, &session).await;
        svc.update_settings(
            &session,
            "author-1",
            QuizSettings {
                title: "Geography".to_string(),
                ..QuizSettings::default()
            },
        )
        .await
        .unwrap();

        let outcome = svc.submit(&session, "author-1", false).await.unwrap();
        assert_eq!(outcome.quiz.title, "Geography");
        assert!(matches!(
            svc.view(&session, "author-1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_submit_keeps_the_session() {
        let svc = service_with(MockQuizRepository::new());
        let session = svc.open("author-1", "file-1").await.unwrap().session_id;

        assert!(svc.submit(&session, "author-1", false).await.is_err());
        assert!(svc.view(&session, "author-1").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn untouched_sessions_are_evicted() {
        let svc = service_with(MockQuizRepository::new());
        let stale = svc.open("author-1", "file-1").await.unwrap().session_id;
        let busy = svc.open("author-1", "file-1").await.unwrap().session_id;

        tokio::time::sleep(Duration::from_secs(50)).await;
        svc.apply(&busy, "author-1", EditorCommand::AddQuestion)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(50)).await;

        assert_eq!(svc.evict_idle(Duration::from_secs(60)).await, 1);
        assert!(matches!(
            svc.view(&stale, "author-1").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(svc.view(&busy, "author-1").await.unwrap().form.editor.len(), 2);
    }

    #[test]
    fn add_option_command_returns_the_new_id() {
        let mut editor = QuestionEditor::new();
        let id = apply_command(&mut editor, EditorCommand::AddOption { index: 0 }).unwrap();
        assert!(id.is_some());
        assert_eq!(editor.questions()[0].options.len(), 4);
    }
}

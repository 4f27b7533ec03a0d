use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AttemptRepository, DocumentSource, MongoAttemptRepository, MongoDocumentSource,
        MongoQuizRepository, QuizRepository,
    },
    services::{
        attempt_service::AttemptService,
        authoring_service::AuthoringService,
        notifier::{LogNotifier, Notifier},
        quiz_service::QuizService,
        session_sweeper::spawn_sweeper,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Option<Database>,
    pub quiz_service: Arc<QuizService>,
    pub authoring_service: Arc<AuthoringService>,
    pub attempt_service: Arc<AttemptService>,
}

impl AppState {
    pub async fn new(config: &Config) -> AppResult<Self> {
        let db = Database::connect(config).await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        let documents = Arc::new(MongoDocumentSource::new(&db));
        documents.ensure_indexes().await?;

        let mut state = Self::from_parts(
            quiz_repository,
            attempt_repository,
            documents,
            Arc::new(LogNotifier),
            config.store_timeout(),
        );
        state.db = Some(db);

        // Sweepers exit on their own once the services are dropped.
        let idle_ttl = config.session_idle_ttl();
        spawn_sweeper(&state.authoring_service, idle_ttl);
        spawn_sweeper(&state.attempt_service, idle_ttl);
        Ok(state)
    }

    /// Wires the services over any store implementation.
    pub fn from_parts(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
        documents: Arc<dyn DocumentSource>,
        notifier: Arc<dyn Notifier>,
        store_timeout: Duration,
    ) -> Self {
        let quiz_service = Arc::new(QuizService::new(
            quizzes,
            documents,
            notifier.clone(),
            store_timeout,
        ));
        let authoring_service = Arc::new(AuthoringService::new(
            quiz_service.clone(),
            notifier.clone(),
        ));
        let attempt_service = Arc::new(AttemptService::new(
            quiz_service.clone(),
            attempts,
            notifier,
            store_timeout,
        ));

        Self {
            db: None,
            quiz_service,
            authoring_service,
            attempt_service,
        }
    }
}

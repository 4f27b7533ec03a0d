use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use secrecy::ExposeSecret;

use crate::{config::Config, errors::AppResult};

pub const QUIZZES: &str = "quizzes";
pub const QUIZ_QUESTIONS: &str = "quiz_questions";
pub const QUIZ_ATTEMPTS: &str = "quiz_attempts";
pub const QUIZ_ANSWERS: &str = "quiz_answers";
/// Owned by the file manager; only ever read here.
pub const DOCUMENTS: &str = "documents";

const APP_NAME: &str = "dcghub-quiz";

/// Handle to the quiz database shared by every repository.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let options = client_options(config).await?;
        let hosts = options
            .hosts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let database = Self {
            client: Client::with_options(options)?,
            db_name: config.mongo_db_name.clone(),
        };
        database.ping().await?;

        log::info!(
            "Connected to MongoDB database '{}' at {}",
            database.db_name,
            hosts
        );
        Ok(database)
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client.database(&self.db_name).collection(name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.ping().await
    }

    async fn ping(&self) -> AppResult<()> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

/// Driver settings. Connection and server selection give up within the same
/// budget as a single store call, so a dead cluster fails startup quickly.
pub async fn client_options(config: &Config) -> AppResult<ClientOptions> {
    let mut options = ClientOptions::parse(config.mongo_conn_string.expose_secret()).await?;

    options.app_name = Some(APP_NAME.to_string());
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.max_pool_size = Some(10);
    options.min_pool_size = Some(1);
    options.connect_timeout = Some(config.store_timeout());
    options.server_selection_timeout = Some(config.store_timeout());

    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    #[test]
    fn database_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Database>();
    }

    #[tokio::test]
    async fn client_options_follow_the_store_timeout() {
        let config = Config {
            mongo_conn_string: SecretString::from("mongodb://db-a:27017,db-b:27018".to_string()),
            store_timeout_secs: 7,
            ..Config::test_config()
        };

        let options = client_options(&config).await.unwrap();

        assert_eq!(options.app_name.as_deref(), Some("dcghub-quiz"));
        assert_eq!(options.hosts.len(), 2);
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(7)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(7)));
        assert_eq!(options.max_pool_size, Some(10));
    }

    #[tokio::test]
    async fn malformed_connection_string_is_rejected() {
        let config = Config {
            mongo_conn_string: SecretString::from("not-a-mongo-uri".to_string()),
            ..Config::test_config()
        };

        assert!(client_options(&config).await.is_err());
    }
}

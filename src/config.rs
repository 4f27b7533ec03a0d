use std::{env, time::Duration};

use secrecy::SecretString;

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: SecretString,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub store_timeout_secs: u64,
    pub session_idle_secs: u64,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: SecretString::from(
                env::var("MONGO_CONN_STRING")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            ),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "dcghub-local".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s: &u64| *s > 0)
                .unwrap_or(10),
            session_idle_secs: env::var("SESSION_IDLE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s: &u64| *s > 0)
                .unwrap_or(1800),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|o| !o.trim().is_empty()),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// How long an authoring or attempt session may sit untouched before it is dropped.
    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: SecretString::from("mongodb://localhost:27017".to_string()),
            mongo_db_name: "dcghub-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            store_timeout_secs: 2,
            session_idle_secs: 60,
            cors_allowed_origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        assert!(!config.mongo_conn_string.expose_secret().is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(config.store_timeout_secs > 0);
        assert!(config.session_idle_ttl() >= Duration::from_secs(1));
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.mongo_db_name, "dcghub-test");
        assert_eq!(config.store_timeout(), Duration::from_secs(2));
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(60));
        assert!(config.cors_allowed_origin.is_none());
    }
}

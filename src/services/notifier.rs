use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }
}

/// Receives user-facing messages. Calls are fire-and-forget.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: &str, notice: Notice);
}

/// Writes notices to the application log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, user_id: &str, notice: Notice) {
        match &notice {
            Notice::Success(message) => log::info!("[notice:{}] {}", user_id, message),
            Notice::Error(message) => log::warn!("[notice:{}] {}", user_id, message),
        }
    }
}

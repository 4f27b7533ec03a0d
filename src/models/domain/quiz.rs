use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::quiz_question::QuizQuestion;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file_id: Option<String>,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    pub shuffle_questions: bool,
    pub shuffle_answers: bool,
    pub created_at: DateTime<Utc>,
}

/// Settings captured by the authoring form before a quiz exists.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizSettings {
    pub title: String,
    pub description: Option<String>,
    pub time_limit_minutes: Option<u32>,
    pub shuffle_questions: bool,
    pub shuffle_answers: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            time_limit_minutes: None,
            shuffle_questions: true,
            shuffle_answers: true,
        }
    }
}

impl Quiz {
    pub fn new(settings: &QuizSettings, source_file_id: &str, owner_id: &str) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            title: settings.title.trim().to_string(),
            description: settings
                .description
                .as_ref()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            source_file_id: Some(source_file_id.to_string()),
            owner_id: owner_id.to_string(),
            time_limit_minutes: settings.time_limit_minutes,
            shuffle_questions: settings.shuffle_questions,
            shuffle_answers: settings.shuffle_answers,
            created_at: Utc::now(),
        }
    }

    /// Countdown length for one attempt, `None` when the quiz is untimed.
    pub fn time_limit_seconds(&self) -> Option<u32> {
        self.time_limit_minutes.map(|m| m.saturating_mul(60))
    }
}

/// A quiz with its questions in authored order.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizWithQuestions {
    pub quiz: Quiz,
    pub questions: Vec<QuizQuestion>,
}

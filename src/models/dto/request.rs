use serde::Deserialize;
use validator::Validate;

use crate::models::domain::QuizSettings;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OpenAuthoringRequest {
    #[validate(length(min = 1, message = "source_file_id is required"))]
    pub source_file_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuizSettingsRequest {
    #[validate(length(max = 200))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 600, message = "time limit must be between 1 and 600 minutes"))]
    pub time_limit_minutes: Option<u32>,

    #[serde(default = "default_true")]
    pub shuffle_questions: bool,

    #[serde(default = "default_true")]
    pub shuffle_answers: bool,
}

impl From<QuizSettingsRequest> for QuizSettings {
    fn from(request: QuizSettingsRequest) -> Self {
        QuizSettings {
            title: request.title,
            description: request.description,
            time_limit_minutes: request.time_limit_minutes,
            shuffle_questions: request.shuffle_questions,
            shuffle_answers: request.shuffle_answers,
        }
    }
}

/// One edit to the question list. Indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditorCommand {
    AddQuestion,
    RemoveQuestion { index: usize },
    UpdateQuestionText { index: usize, text: String },
    UpdateExplanation { index: usize, text: String },
    AddOption { index: usize },
    RemoveOption { index: usize, option_index: usize },
    UpdateOption { index: usize, option_index: usize, value: String },
    ToggleCorrectAnswer { index: usize, option_id: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,

    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_commands_use_op_tag() {
        let cmd: EditorCommand = serde_json::from_str(
            r#"{"op":"update_option","index":0,"option_index":2,"value":"Paris"}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            EditorCommand::UpdateOption {
                index: 0,
                option_index: 2,
                value: "Paris".to_string()
            }
        );

        let cmd: EditorCommand = serde_json::from_str(r#"{"op":"add_question"}"#).unwrap();
        assert_eq!(cmd, EditorCommand::AddQuestion);
    }

    #[test]
    fn settings_default_to_shuffled() {
        let request: QuizSettingsRequest =
            serde_json::from_str(r#"{"title":"Chapter 1"}"#).unwrap();
        assert!(request.shuffle_questions);
        assert!(request.shuffle_answers);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        let request: QuizSettingsRequest =
            serde_json::from_str(r#"{"title":"Chapter 1","time_limit_minutes":0}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn submit_defaults_to_publish() {
        let request: SubmitQuizRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.draft);
    }
}

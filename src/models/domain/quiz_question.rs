use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A persisted question. Correct answers are always a set; rows written by
/// the single-answer schema (`correct_answer`) or with JSON-encoded options
/// are normalised on read.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "StoredQuizQuestion")]
pub struct QuizQuestion {
    pub id: String,
    pub quiz_id: String,
    pub position: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answers: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// More than one option must be picked to answer correctly.
    pub fn is_multi_answer(&self) -> bool {
        self.correct_answers.len() > 1
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }

    /// Exact set equality; a partial selection of a multi-answer question is wrong.
    pub fn is_answered_correctly(&self, selected: &BTreeSet<String>) -> bool {
        !selected.is_empty() && *selected == self.correct_answers
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredOptions {
    List(Vec<String>),
    Encoded(String),
}

#[derive(Deserialize)]
struct StoredQuizQuestion {
    id: String,
    quiz_id: String,
    #[serde(default)]
    position: u32,
    question: String,
    options: StoredOptions,
    #[serde(default)]
    correct_answers: Option<BTreeSet<String>>,
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

impl TryFrom<StoredQuizQuestion> for QuizQuestion {
    type Error = String;

    fn try_from(stored: StoredQuizQuestion) -> Result<Self, Self::Error> {
        let options = match stored.options {
            StoredOptions::List(options) => options,
            StoredOptions::Encoded(raw) => serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| format!("question '{}' has malformed options: {}", stored.id, e))?,
        };

        let correct_answers = match (stored.correct_answers, stored.correct_answer) {
            (Some(set), _) if !set.is_empty() => set,
            (_, Some(single)) => BTreeSet::from([single]),
            _ => return Err(format!("question '{}' has no correct answer", stored.id)),
        };

        Ok(QuizQuestion {
            id: stored.id,
            quiz_id: stored.quiz_id,
            position: stored.position,
            question: stored.question,
            options,
            correct_answers,
            explanation: stored.explanation.filter(|e| !e.trim().is_empty()),
        })
    }
}

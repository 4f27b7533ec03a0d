use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::QuizQuestion,
    services::question_generator::GeneratedQuestion,
};

const MIN_OPTIONS: usize = 2;
const DEFAULT_OPTIONS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorOption {
    pub id: String,
    pub text: String,
}

impl EditorOption {
    fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
        }
    }
}

/// A question being authored. Correct answers reference options by id, so
/// rewording an option keeps it marked correct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<EditorOption>,
    pub correct_option_ids: BTreeSet<String>,
    pub explanation: Option<String>,
}

impl EditorQuestion {
    fn blank() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: String::new(),
            options: (0..DEFAULT_OPTIONS).map(|_| EditorOption::new("")).collect(),
            correct_option_ids: BTreeSet::new(),
            explanation: None,
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.text.trim().is_empty() {
            return Err(AppError::ValidationError(
                "question text cannot be empty".to_string(),
            ));
        }
        if self.options.iter().any(|o| o.text.trim().is_empty()) {
            return Err(AppError::ValidationError(
                "options cannot be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if !self.options.iter().all(|o| seen.insert(o.text.trim())) {
            return Err(AppError::ValidationError(
                "options must be distinct".to_string(),
            ));
        }
        if self.correct_option_ids.is_empty() {
            return Err(AppError::ValidationError(
                "select at least one correct answer".to_string(),
            ));
        }
        Ok(())
    }

    fn correct_values(&self) -> BTreeSet<String> {
        self.options
            .iter()
            .filter(|o| self.correct_option_ids.contains(&o.id))
            .map(|o| o.text.trim().to_string())
            .collect()
    }
}

/// The in-progress question list of one authoring session. Always holds at
/// least one question, and every question at least two options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionEditor {
    questions: Vec<EditorQuestion>,
}

impl Default for QuestionEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionEditor {
    pub fn new() -> Self {
        Self {
            questions: vec![EditorQuestion::blank()],
        }
    }

    /// Seeds the editor from generator output; the first option of each
    /// generated question is the one marked correct.
    pub fn from_generated(generated: Vec<GeneratedQuestion>) -> Self {
        if generated.is_empty() {
            return Self::new();
        }

        let questions = generated
            .into_iter()
            .map(|g| {
                let options: Vec<EditorOption> =
                    g.options.into_iter().map(EditorOption::new).collect();
                let correct_option_ids = options
                    .iter()
                    .filter(|o| o.text == g.correct_answer)
                    .map(|o| o.id.clone())
                    .take(1)
                    .collect();
                EditorQuestion {
                    id: Uuid::new_v4().to_string(),
                    text: g.question,
                    options,
                    correct_option_ids,
                    explanation: None,
                }
            })
            .collect();

        Self { questions }
    }

    pub fn questions(&self) -> &[EditorQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn add_question(&mut self) -> usize {
        self.questions.push(EditorQuestion::blank());
        self.questions.len() - 1
    }

    pub fn remove_question(&mut self, index: usize) -> AppResult<()> {
        self.question(index)?;
        if self.questions.len() <= 1 {
            return Err(AppError::ValidationError(
                "a quiz needs at least one question".to_string(),
            ));
        }
        self.questions.remove(index);
        Ok(())
    }

    pub fn update_question_text(&mut self, index: usize, text: &str) -> AppResult<()> {
        self.question_mut(index)?.text = text.to_string();
        Ok(())
    }

    pub fn update_explanation(&mut self, index: usize, text: &str) -> AppResult<()> {
        self.question_mut(index)?.explanation = if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        Ok(())
    }

    /// Appends a blank option and returns its id.
    pub fn add_option(&mut self, index: usize) -> AppResult<String> {
        let option = EditorOption::new("");
        let id = option.id.clone();
        self.question_mut(index)?.options.push(option);
        Ok(id)
    }

    pub fn remove_option(&mut self, index: usize, option_index: usize) -> AppResult<()> {
        let question = self.question_mut(index)?;
        if option_index >= question.options.len() {
            return Err(AppError::NotFound(format!(
                "option {} of question {}",
                option_index + 1,
                index + 1
            )));
        }
        if question.options.len() <= MIN_OPTIONS {
            return Err(AppError::ValidationError(format!(
                "a question needs at least {} options",
                MIN_OPTIONS
            )));
        }
        let removed = question.options.remove(option_index);
        question.correct_option_ids.remove(&removed.id);
        Ok(())
    }

    pub fn update_option(&mut self, index: usize, option_index: usize, value: &str) -> AppResult<()> {
        let question = self.question_mut(index)?;
        let option = question.options.get_mut(option_index).ok_or_else(|| {
            AppError::NotFound(format!("option {} of question {}", option_index + 1, index + 1))
        })?;
        option.text = value.to_string();
        Ok(())
    }

    /// Flips whether `option_id` counts as a correct answer. Returns the new state.
    pub fn toggle_correct_answer(&mut self, index: usize, option_id: &str) -> AppResult<bool> {
        let question = self.question_mut(index)?;
        if !question.options.iter().any(|o| o.id == option_id) {
            return Err(AppError::NotFound(format!(
                "option '{}' of question {}",
                option_id,
                index + 1
            )));
        }
        if question.correct_option_ids.remove(option_id) {
            Ok(false)
        } else {
            question.correct_option_ids.insert(option_id.to_string());
            Ok(true)
        }
    }

    pub fn validate_question(&self, index: usize) -> AppResult<()> {
        self.question(index)?
            .validate()
            .map_err(|e| match e {
                AppError::ValidationError(msg) => {
                    AppError::ValidationError(format!("question {}: {}", index + 1, msg))
                }
                other => other,
            })
    }

    pub fn validate_all(&self) -> AppResult<()> {
        if self.questions.is_empty() {
            return Err(AppError::ValidationError(
                "a quiz needs at least one question".to_string(),
            ));
        }
        (0..self.questions.len()).try_for_each(|i| self.validate_question(i))
    }

    /// Persistable questions for `quiz_id`, in editor order.
    pub fn to_quiz_questions(&self, quiz_id: &str) -> Vec<QuizQuestion> {
        self.questions
            .iter()
            .enumerate()
            .map(|(position, q)| QuizQuestion {
                id: Uuid::new_v4().to_string(),
                quiz_id: quiz_id.to_string(),
                position: position as u32,
                question: q.text.trim().to_string(),
                options: q.options.iter().map(|o| o.text.trim().to_string()).collect(),
                correct_answers: q.correct_values(),
                explanation: q
                    .explanation
                    .as_ref()
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty()),
            })
            .collect()
    }

    fn question(&self, index: usize) -> AppResult<&EditorQuestion> {
        self.questions
            .get(index)
            .ok_or_else(|| AppError::NotFound(format!("question {}", index + 1)))
    }

    fn question_mut(&mut self, index: usize) -> AppResult<&mut EditorQuestion> {
        self.questions
            .get_mut(index)
            .ok_or_else(|| AppError::NotFound(format!("question {}", index + 1)))
    }
}

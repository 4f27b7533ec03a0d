use serde::Serialize;

use crate::{
    models::domain::{Quiz, QuizAttempt, QuizQuestion, QuizWithQuestions},
    services::{
        attempt_runtime::{AttemptPhase, AttemptRuntime, PersistenceStatus},
        results::QuizReport,
    },
};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The current question as the learner sees it. Correct answers are never
/// sent while the run is in progress.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub multi_select: bool,
    pub selected: Vec<String>,
}

/// A quiz as anyone but its owner sees it: questions without the answer key.
#[derive(Debug, Clone, Serialize)]
pub struct QuizPreview {
    pub quiz: Quiz,
    pub questions: Vec<QuestionPreview>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionPreview {
    pub id: String,
    pub position: u32,
    pub question: String,
    pub options: Vec<String>,
    pub multi_select: bool,
}

impl From<&QuizQuestion> for QuestionPreview {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            id: q.id.clone(),
            position: q.position,
            question: q.question.clone(),
            options: q.options.clone(),
            multi_select: q.is_multi_answer(),
        }
    }
}

impl From<QuizWithQuestions> for QuizPreview {
    fn from(data: QuizWithQuestions) -> Self {
        Self {
            questions: data.questions.iter().map(QuestionPreview::from).collect(),
            quiz: data.quiz,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub report: QuizReport,
    pub persistence: PersistenceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptView {
    pub session_id: String,
    pub quiz_id: String,
    pub title: String,
    pub phase: AttemptPhase,
    pub current_index: usize,
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsView>,
}

impl AttemptView {
    pub fn from_runtime(session_id: &str, runtime: &AttemptRuntime) -> Self {
        let question = runtime.current_question().map(|q| QuestionView {
            id: q.id.clone(),
            question: q.question.clone(),
            options: q.options.clone(),
            multi_select: q.is_multi_answer(),
            selected: runtime
                .selection(&q.id)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default(),
        });

        let results = runtime.completion().map(|c| ResultsView {
            report: c.report.clone(),
            persistence: c.persistence.clone(),
        });

        AttemptView {
            session_id: session_id.to_string(),
            quiz_id: runtime.quiz().id.clone(),
            title: runtime.quiz().title.clone(),
            phase: runtime.phase(),
            current_index: runtime.current_index(),
            total_questions: runtime.total_questions(),
            remaining_seconds: runtime.remaining_seconds(),
            question,
            results,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttemptHistoryResponse {
    pub quiz_id: String,
    pub attempts: Vec<QuizAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_percentage: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{question, sample_quiz};

    #[test]
    fn preview_carries_no_answer_key() {
        let mut data = sample_quiz(None);
        data.questions[0].explanation = Some("Paris is the capital".to_string());
        data.questions
            .push(question("quiz-1", 3, "Even numbers?", &["2", "4", "7"], &["2", "4"]));

        let preview = QuizPreview::from(data);
        assert_eq!(preview.questions.len(), 4);
        assert!(preview.questions[3].multi_select);

        let json = serde_json::to_value(&preview).unwrap();
        let first = &json["questions"][0];
        assert_eq!(first["options"][0], "Paris");
        assert!(first.get("correct_answers").is_none());
        assert!(first.get("explanation").is_none());
    }
}

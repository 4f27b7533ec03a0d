use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::domain::QuizQuestion;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceBand {
    Excellent,
    Good,
    #[serde(rename = "Keep trying")]
    KeepTrying,
}

impl PerformanceBand {
    pub fn for_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => PerformanceBand::Excellent,
            60..=79 => PerformanceBand::Good,
            _ => PerformanceBand::KeepTrying,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "Excellent",
            PerformanceBand::Good => "Good",
            PerformanceBand::KeepTrying => "Keep trying",
        }
    }
}

impl std::fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub question: String,
    pub selected_answers: BTreeSet<String>,
    pub is_correct: bool,
    /// Only present when the learner got the question wrong.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizReport {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub band: PerformanceBand,
    pub questions: Vec<QuestionOutcome>,
}

pub fn percentage(score: u32, total_questions: u32) -> u32 {
    if total_questions == 0 {
        return 0;
    }
    (f64::from(score) / f64::from(total_questions) * 100.0).round() as u32
}

/// Grades every question against the recorded selections. Unanswered
/// questions count as incorrect.
pub fn build_report(
    questions: &[QuizQuestion],
    selections: &HashMap<String, BTreeSet<String>>,
) -> QuizReport {
    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .map(|q| {
            let selected_answers = selections.get(&q.id).cloned().unwrap_or_default();
            let is_correct = q.is_answered_correctly(&selected_answers);
            QuestionOutcome {
                question_id: q.id.clone(),
                question: q.question.clone(),
                correct_answers: (!is_correct).then(|| q.correct_answers.clone()),
                selected_answers,
                is_correct,
                explanation: q.explanation.clone(),
            }
        })
        .collect();

    let score = outcomes.iter().filter(|o| o.is_correct).count() as u32;
    let total_questions = outcomes.len() as u32;
    let percentage = percentage(score, total_questions);

    QuizReport {
        score,
        total_questions,
        percentage,
        band: PerformanceBand::for_percentage(percentage),
        questions: outcomes,
    }
}

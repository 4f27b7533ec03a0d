//! One learner's pass through a quiz.
//!
//! The runtime is synchronous and owns no timer; whoever drives it calls
//! [`AttemptRuntime::tick`] once per second. Both the countdown and
//! [`AttemptRuntime::advance`] reach completion through the same latch, so a
//! run produces at most one [`CompletedAttempt`] no matter which fires first.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, seq::SliceRandom};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AttemptAnswer, Quiz, QuizAttempt, QuizQuestion, QuizWithQuestions},
    services::results::{build_report, QuizReport},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    InProgress,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Pending,
    Saved { attempt_id: String },
    Failed { message: String },
}

/// Records to store once a run finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedAttempt {
    pub attempt: QuizAttempt,
    pub answers: Vec<AttemptAnswer>,
}

#[derive(Clone, Debug)]
pub struct Completion {
    pub attempt: QuizAttempt,
    pub report: QuizReport,
    pub persistence: PersistenceStatus,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Moved(usize),
    Completed(CompletedAttempt),
}

#[derive(Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Untimed,
    Running(u32),
    Expired(CompletedAttempt),
    /// The run already finished; late ticks are ignored.
    Idle,
}

pub struct AttemptRuntime {
    quiz: Quiz,
    authored: Vec<QuizQuestion>,
    questions: Vec<QuizQuestion>,
    user_id: String,
    rng: StdRng,
    current_index: usize,
    selections: HashMap<String, BTreeSet<String>>,
    remaining_seconds: Option<u32>,
    started_at: DateTime<Utc>,
    completion: Option<Completion>,
}

impl AttemptRuntime {
    pub fn new(data: QuizWithQuestions, user_id: &str, rng: StdRng) -> AppResult<Self> {
        if data.questions.is_empty() {
            return Err(AppError::NotFound(format!(
                "Quiz '{}' has no questions",
                data.quiz.id
            )));
        }

        let mut runtime = Self {
            remaining_seconds: data.quiz.time_limit_seconds(),
            quiz: data.quiz,
            questions: Vec::new(),
            authored: data.questions,
            user_id: user_id.to_string(),
            rng,
            current_index: 0,
            selections: HashMap::new(),
            started_at: Utc::now(),
            completion: None,
        };
        runtime.arrange_questions();
        Ok(runtime)
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn phase(&self) -> AttemptPhase {
        if self.completion.is_some() {
            AttemptPhase::Complete
        } else {
            AttemptPhase::InProgress
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    /// Questions in the order this run presents them.
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.phase() {
            AttemptPhase::InProgress => self.questions.get(self.current_index),
            AttemptPhase::Complete => None,
        }
    }

    pub fn selection(&self, question_id: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(question_id)
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Replaces whatever was chosen for the question with `value`.
    pub fn select_answer(&mut self, question_id: &str, value: &str) -> AppResult<()> {
        self.check_answerable(question_id, value)?;
        self.selections
            .insert(question_id.to_string(), BTreeSet::from([value.to_string()]));
        Ok(())
    }

    /// Adds or removes `value` for questions with several correct answers.
    pub fn toggle_answer(&mut self, question_id: &str, value: &str) -> AppResult<()> {
        let question = self.check_answerable(question_id, value)?;
        if !question.is_multi_answer() {
            return Err(AppError::ValidationError(
                "this question takes a single answer".to_string(),
            ));
        }

        let selected = self.selections.entry(question_id.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        if selected.is_empty() {
            self.selections.remove(question_id);
        }
        Ok(())
    }

    /// Moves to the next question, or finishes the run on the last one.
    pub fn advance(&mut self) -> AppResult<AdvanceOutcome> {
        self.ensure_in_progress()?;

        let question = &self.questions[self.current_index];
        if !self.selections.contains_key(&question.id) {
            return Err(AppError::ValidationError("no answer selected".to_string()));
        }

        if self.current_index + 1 >= self.questions.len() {
            return Ok(AdvanceOutcome::Completed(self.complete()));
        }

        self.current_index += 1;
        Ok(AdvanceOutcome::Moved(self.current_index))
    }

    /// One second of countdown.
    pub fn tick(&mut self) -> TickOutcome {
        if self.completion.is_some() {
            return TickOutcome::Idle;
        }
        let Some(remaining) = self.remaining_seconds else {
            return TickOutcome::Untimed;
        };

        let remaining = remaining.saturating_sub(1);
        self.remaining_seconds = Some(remaining);
        if remaining == 0 {
            TickOutcome::Expired(self.complete())
        } else {
            TickOutcome::Running(remaining)
        }
    }

    /// Attaches the store's verdict to the run that produced `attempt_id`.
    /// Results from an earlier run (before a retry) are dropped.
    pub fn record_persistence(&mut self, attempt_id: &str, result: &AppResult<String>) {
        let Some(completion) = self.completion.as_mut() else {
            return;
        };
        if completion.attempt.id != attempt_id {
            return;
        }
        completion.persistence = match result {
            Ok(id) => PersistenceStatus::Saved {
                attempt_id: id.clone(),
            },
            Err(e) => PersistenceStatus::Failed {
                message: e.to_string(),
            },
        };
    }

    /// Starts a fresh run of the same quiz.
    pub fn retry(&mut self) -> AppResult<()> {
        if self.completion.is_none() {
            return Err(AppError::ValidationError(
                "finish the quiz before retrying".to_string(),
            ));
        }

        self.completion = None;
        self.current_index = 0;
        self.selections.clear();
        self.remaining_seconds = self.quiz.time_limit_seconds();
        self.started_at = Utc::now();
        self.arrange_questions();
        Ok(())
    }

    fn complete(&mut self) -> CompletedAttempt {
        let report = build_report(&self.questions, &self.selections);
        let attempt_id = Uuid::new_v4().to_string();
        let completed_at = Utc::now();
        let elapsed = (completed_at - self.started_at).num_seconds().max(0);

        let attempt = QuizAttempt {
            id: attempt_id.clone(),
            quiz_id: self.quiz.id.clone(),
            user_id: self.user_id.clone(),
            score: report.score,
            total_questions: report.total_questions,
            time_taken_seconds: u32::try_from(elapsed).ok(),
            completed_at,
        };

        let answers = report
            .questions
            .iter()
            .map(|o| AttemptAnswer {
                attempt_id: attempt_id.clone(),
                question_id: o.question_id.clone(),
                selected_answers: o.selected_answers.clone(),
                is_correct: o.is_correct,
            })
            .collect();

        log::info!(
            "Attempt {} on quiz {} finished with {}/{}",
            attempt.id,
            attempt.quiz_id,
            attempt.score,
            attempt.total_questions
        );

        self.completion = Some(Completion {
            attempt: attempt.clone(),
            report,
            persistence: PersistenceStatus::Pending,
        });

        CompletedAttempt { attempt, answers }
    }

    fn arrange_questions(&mut self) {
        let mut questions = self.authored.clone();
        if self.quiz.shuffle_questions {
            questions.shuffle(&mut self.rng);
        }
        if self.quiz.shuffle_answers {
            for question in &mut questions {
                question.options.shuffle(&mut self.rng);
            }
        }
        self.questions = questions;
    }

    fn ensure_in_progress(&self) -> AppResult<()> {
        if self.completion.is_some() {
            return Err(AppError::ValidationError(
                "this attempt is already complete".to_string(),
            ));
        }
        Ok(())
    }

    fn check_answerable(&self, question_id: &str, value: &str) -> AppResult<&QuizQuestion> {
        self.ensure_in_progress()?;

        let current = &self.questions[self.current_index];
        if current.id != question_id {
            return if self.questions.iter().any(|q| q.id == question_id) {
                Err(AppError::ValidationError(
                    "only the current question can be answered".to_string(),
                ))
            } else {
                Err(AppError::NotFound(format!("question '{}'", question_id)))
            };
        }
        if !current.has_option(value) {
            return Err(AppError::ValidationError(format!(
                "'{}' is not an option for this question",
                value
            )));
        }
        Ok(current)
    }
}

//! Heuristic multiple-choice generation from plain document text.
//!
//! Output is fully deterministic: the same text always yields the same
//! questions in the same order, with the correct answer as the first option.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAX_GENERATED_QUESTIONS: usize = 5;
const MIN_PARAGRAPH_CHARS: usize = 100;
const MAX_TOPIC_CHARS: usize = 100;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("PARAGRAPH_BREAK is a valid regex pattern"));

const STEMS: [&str; 5] = [
    "According to the text, what follows from: \"{topic}\"?",
    "Which statement best explains \"{topic}\"?",
    "What does the document say right after \"{topic}\"?",
    "Which of these is supported by the passage on \"{topic}\"?",
    "What is the key point connected to \"{topic}\"?",
];

const FALLBACK_ANSWER: &str = "The passage describes this concept in detail.";

pub const DISTRACTORS: [&str; 3] = [
    "The text does not discuss this topic.",
    "The opposite of what the passage states.",
    "None of the statements in the passage apply.",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub correct_answer: String,
    pub options: Vec<String>,
}

/// Turns raw text into at most five questions. Returns an empty list when no
/// paragraph is long enough; callers decide what that means for the user.
pub fn generate_questions(text: &str) -> Vec<GeneratedQuestion> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .take(MAX_GENERATED_QUESTIONS)
        .enumerate()
        .map(|(i, paragraph)| question_from_paragraph(i, paragraph))
        .collect()
}

fn question_from_paragraph(index: usize, paragraph: &str) -> GeneratedQuestion {
    let mut sentences = paragraph.split('.');

    let topic: String = sentences
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_TOPIC_CHARS)
        .collect();

    let correct_answer = sentences
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_ANSWER)
        .to_string();

    let question = STEMS[index % STEMS.len()].replace("{topic}", &topic);

    let mut options = Vec::with_capacity(DISTRACTORS.len() + 1);
    options.push(correct_answer.clone());
    options.extend(DISTRACTORS.iter().map(|d| d.to_string()));

    GeneratedQuestion {
        question,
        correct_answer,
        options,
    }
}

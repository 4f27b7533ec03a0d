use std::collections::BTreeSet;

use chrono::Utc;

use crate::models::domain::{Quiz, QuizAttempt, QuizQuestion, QuizSettings, QuizWithQuestions};

/// A three-question quiz with id `quiz-1`; every question's first option is correct.
pub fn sample_quiz(time_limit_minutes: Option<u32>) -> QuizWithQuestions {
    let settings = QuizSettings {
        title: "Chapter 1".to_string(),
        time_limit_minutes,
        ..QuizSettings::default()
    };
    let mut quiz = Quiz::new(&settings, "file-1", "author-1");
    quiz.id = "quiz-1".to_string();

    let questions = [
        ("Capital of France?", ["Paris", "Lyon", "Nice"]),
        ("Largest planet?", ["Jupiter", "Mars", "Venus"]),
        ("Boiling point of water in Celsius?", ["100", "90", "80"]),
    ]
    .iter()
    .enumerate()
    .map(|(i, (text, options))| question(&quiz.id, i as u32, text, options, &[options[0]]))
    .collect();

    QuizWithQuestions { quiz, questions }
}

pub fn question(
    quiz_id: &str,
    position: u32,
    text: &str,
    options: &[&str],
    correct: &[&str],
) -> QuizQuestion {
    QuizQuestion {
        id: format!("{}-q{}", quiz_id, position + 1),
        quiz_id: quiz_id.to_string(),
        position,
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answers: correct.iter().map(|c| c.to_string()).collect::<BTreeSet<_>>(),
        explanation: None,
    }
}

pub fn attempt(user_id: &str, quiz_id: &str, score: u32, total_questions: u32) -> QuizAttempt {
    QuizAttempt {
        id: uuid::Uuid::new_v4().to_string(),
        quiz_id: quiz_id.to_string(),
        user_id: user_id.to_string(),
        score,
        total_questions,
        time_taken_seconds: Some(30),
        completed_at: Utc::now(),
    }
}

pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

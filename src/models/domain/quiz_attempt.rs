use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A finished run through a quiz. Only completed runs are ever stored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub score: u32,
    pub total_questions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<u32>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptAnswer {
    pub attempt_id: String,
    pub question_id: String,
    pub selected_answers: BTreeSet<String>,
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_round_trip_serialization_preserves_score_fields() {
        let attempt = QuizAttempt {
            id: "attempt-1".to_string(),
            quiz_id: "quiz-1".to_string(),
            user_id: "user-1".to_string(),
            score: 3,
            total_questions: 5,
            time_taken_seconds: None,
            completed_at: Utc::now(),
        };

        let json = serde_json::to_string(&attempt).expect("attempt should serialize");
        assert!(!json.contains("time_taken_seconds"));

        let parsed: QuizAttempt = serde_json::from_str(&json).expect("attempt should deserialize");
        assert_eq!(parsed.score, 3);
        assert_eq!(parsed.total_questions, 5);
        assert_eq!(parsed.time_taken_seconds, None);
    }
}

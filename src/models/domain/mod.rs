pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub mod source_document;
pub use quiz::{Quiz, QuizSettings, QuizWithQuestions};
pub use quiz_attempt::{AttemptAnswer, QuizAttempt};
pub use quiz_question::QuizQuestion;
pub use source_document::SourceDocument;

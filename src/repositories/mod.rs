pub mod attempt_repository;
pub mod document_repository;
pub mod quiz_repository;

pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use document_repository::{DocumentSource, MongoDocumentSource};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};

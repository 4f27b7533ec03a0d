use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inputs shorter than this cannot yield paragraphs long enough to question.
pub const MIN_GENERATION_CHARS: usize = 200;

/// A file from the resource repository, reduced to its extracted text.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDocument {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// What a document offers to the question generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentContent {
    Usable(String),
    TooShort { length: usize },
}

impl SourceDocument {
    pub fn into_content(self) -> DocumentContent {
        let length = self.content.trim().chars().count();
        if length < MIN_GENERATION_CHARS {
            DocumentContent::TooShort { length }
        } else {
            DocumentContent::Usable(self.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(content: &str) -> SourceDocument {
        SourceDocument {
            id: "file-1".to_string(),
            name: "notes.txt".to_string(),
            content: content.to_string(),
            created_at: Some(Utc::now()),
        }
    }

    #[test]
    fn short_documents_are_flagged() {
        let content = document("Too short to question.").into_content();
        assert_eq!(content, DocumentContent::TooShort { length: 22 });
    }

    #[test]
    fn padding_whitespace_does_not_count_towards_length() {
        let padded = format!("{}{}", " ".repeat(300), "x".repeat(150));
        assert_eq!(
            document(&padded).into_content(),
            DocumentContent::TooShort { length: 150 }
        );
    }

    #[test]
    fn long_documents_are_usable() {
        let text = "a".repeat(MIN_GENERATION_CHARS);
        assert_eq!(
            document(&text).into_content(),
            DocumentContent::Usable(text.clone())
        );
    }
}

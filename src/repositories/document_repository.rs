use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{Database, DOCUMENTS},
    errors::{AppError, AppResult},
    models::domain::{source_document::DocumentContent, SourceDocument},
};

/// Supplies the text of files held by the resource repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_content(&self, file_id: &str) -> AppResult<DocumentContent>;
}

pub struct MongoDocumentSource {
    collection: Collection<SourceDocument>,
}

impl MongoDocumentSource {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection(DOCUMENTS);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for documents collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;

        log::info!("Successfully created indexes for documents collection");
        Ok(())
    }
}

#[async_trait]
impl DocumentSource for MongoDocumentSource {
    async fn fetch_content(&self, file_id: &str) -> AppResult<DocumentContent> {
        let document = self
            .collection
            .find_one(doc! { "id": file_id })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document with id '{}' not found", file_id)))?;

        Ok(document.into_content())
    }
}

// Document persistence boundary
// Author: kelexine (https://github.com/kelexine)

use super::models::{CreateDocument, Document, UpdateDocument};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Durable storage for documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, owner_id: &str, document: CreateDocument) -> Result<Document>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// All documents of `owner_id`, oldest first.
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Document>>;

    /// Apply `changes`; `None` when the document does not exist.
    async fn update(&self, id: &str, changes: UpdateDocument) -> Result<Option<Document>>;

    /// `false` when the document does not exist.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Process-local [`DocumentRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, owner_id: &str, document: CreateDocument) -> Result<Document> {
        let now = Utc::now();
        let created = Document {
            id: uuid::Uuid::new_v4().to_string(),
            title: document.title,
            content: document.content,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.documents
            .write()
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().get(id).cloned())
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Document>> {
        let mut owned: Vec<Document> = self
            .documents
            .read()
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn update(&self, id: &str, changes: UpdateDocument) -> Result<Option<Document>> {
        let mut documents = self.documents.write();
        let Some(document) = documents.get_mut(id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            document.title = title;
        }
        if let Some(content) = changes.content {
            document.content = content;
        }
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.documents.write().remove(id).is_some())
    }
}

// Document operations with cache coordination
// Author: kelexine (https://github.com/kelexine)

use super::models::{CreateDocument, Document, UpdateDocument};
use super::repository::DocumentRepository;
use crate::analysis::{analyze, Analysis, AnalysisField};
use crate::cache::{CacheStats, DerivedCache, ListCache};
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns document persistence and keeps the caches consistent with it.
///
/// Every content-changing write is persisted first and the derived cache is
/// invalidated before the call returns.
pub struct DocumentService {
    repository: Arc<dyn DocumentRepository>,
    cache: Arc<DerivedCache>,
    lists: ListCache,
}

impl DocumentService {
    pub fn new(repository: Arc<dyn DocumentRepository>, cache: Arc<DerivedCache>, lists: ListCache) -> Self {
        Self {
            repository,
            cache,
            lists,
        }
    }

    pub async fn create(&self, owner_id: &str, request: CreateDocument) -> Result<Document> {
        let request = request.normalized()?;
        let document = self.repository.create(owner_id, request).await?;
        info!("Created document {} for user {}", document.id, owner_id);

        let appended = document.clone();
        self.lists
            .update::<Document, _>(owner_id, move |list| list.push(appended))
            .await;
        Ok(document)
    }

    /// Fetch a document owned by `owner_id`.
    pub async fn get(&self, id: &str, owner_id: &str) -> Result<Document> {
        let document = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;
        if document.owner_id != owner_id {
            return Err(AppError::Forbidden);
        }
        Ok(document)
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<Document>> {
        if let Some(cached) = self.lists.get::<Document>(owner_id).await {
            return Ok(cached);
        }
        let documents = self.repository.find_by_owner(owner_id).await?;
        self.lists.put(owner_id, &documents).await;
        Ok(documents)
    }

    pub async fn update(&self, id: &str, owner_id: &str, changes: UpdateDocument) -> Result<Document> {
        let changes = changes.normalized()?;
        self.get(id, owner_id).await?;

        let updated = self
            .repository
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Document {} vanished during update", id)))?;
        self.cache.invalidate_document(id).await;
        info!("Updated document {}", id);

        let replacement = updated.clone();
        self.lists
            .update::<Document, _>(owner_id, move |list| {
                if let Some(slot) = list.iter_mut().find(|d| d.id == replacement.id) {
                    *slot = replacement;
                }
            })
            .await;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str, owner_id: &str) -> Result<()> {
        self.get(id, owner_id).await?;

        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound);
        }
        self.cache.invalidate_document(id).await;
        info!("Deleted document {}", id);

        let removed = id.to_string();
        self.lists
            .update::<Document, _>(owner_id, move |list| list.retain(|d| d.id != removed))
            .await;
        Ok(())
    }

    /// Full analysis, from cache when it matches the current content.
    pub async fn analyze(&self, id: &str, owner_id: &str) -> Result<Analysis> {
        let document = self.get(id, owner_id).await?;
        if let Some(cached) = self.cache.get_full_analysis(id, &document.content).await {
            return Ok(cached);
        }

        debug!("Computing analysis for document {}", id);
        let analysis = analyze(&document.content);
        self.cache
            .put_full_analysis(id, &document.content, &analysis)
            .await;
        Ok(analysis)
    }

    pub async fn word_count(&self, id: &str, owner_id: &str) -> Result<u64> {
        self.field(id, owner_id, AnalysisField::WordCount, |a| a.word_count)
            .await
    }

    pub async fn character_count(&self, id: &str, owner_id: &str) -> Result<u64> {
        self.field(id, owner_id, AnalysisField::CharacterCount, |a| a.character_count)
            .await
    }

    pub async fn sentence_count(&self, id: &str, owner_id: &str) -> Result<u64> {
        self.field(id, owner_id, AnalysisField::SentenceCount, |a| a.sentence_count)
            .await
    }

    pub async fn paragraph_count(&self, id: &str, owner_id: &str) -> Result<u64> {
        self.field(id, owner_id, AnalysisField::ParagraphCount, |a| a.paragraph_count)
            .await
    }

    pub async fn longest_words(&self, id: &str, owner_id: &str) -> Result<Vec<String>> {
        self.field(id, owner_id, AnalysisField::LongestWords, |a| a.longest_words)
            .await
    }

    pub async fn cache_health(&self) -> bool {
        self.cache.ping().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Single metric: field cache, then the full analysis path.
    async fn field<T, F>(&self, id: &str, owner_id: &str, field: AnalysisField, pick: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce(Analysis) -> T + Send,
    {
        let document = self.get(id, owner_id).await?;
        if let Some(cached) = self.cache.get_field::<T>(id, field, &document.content).await {
            return Ok(cached);
        }

        let value = pick(self.analyze(id, owner_id).await?);
        self.cache
            .put_field(id, field, &document.content, &value)
            .await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::{analysis_key, field_key, fingerprint_key, user_documents_key};
    use crate::config::CacheConfig;
    use crate::documents::InMemoryDocumentRepository;
    use crate::store::MemoryStore;

    fn service() -> (DocumentService, MemoryStore) {
        let store = MemoryStore::new();
        let shared: Arc<dyn crate::store::KeyValueStore> = Arc::new(store.clone());
        let cache = Arc::new(DerivedCache::new(shared.clone(), CacheConfig::default()));
        let lists = ListCache::new(shared, 3600, true);
        let service = DocumentService::new(Arc::new(InMemoryDocumentRepository::new()), cache, lists);
        (service, store)
    }

    fn doc(title: &str, content: &str) -> CreateDocument {
        CreateDocument {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ownership_is_enforced() {
        let (service, _) = service();
        let created = service.create("alice", doc("t", "hello")).await.unwrap();

        assert!(service.get(&created.id, "alice").await.is_ok());
        assert!(matches!(
            service.get(&created.id, "bob").await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service.get("missing", "alice").await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_invalidates_derived_keys() {
        let (service, store) = service();
        let created = service.create("alice", doc("t", "One two.")).await.unwrap();

        assert_eq!(service.analyze(&created.id, "alice").await.unwrap().word_count, 2);
        assert_eq!(service.word_count(&created.id, "alice").await.unwrap(), 2);
        assert!(store.contains_key(&analysis_key(&created.id)));
        assert!(store.contains_key(&field_key(AnalysisField::WordCount, &created.id)));

        service
            .update(
                &created.id,
                "alice",
                UpdateDocument {
                    title: None,
                    content: Some("One two three.".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(!store.contains_key(&analysis_key(&created.id)));
        assert!(!store.contains_key(&fingerprint_key(&created.id)));

        assert_eq!(service.word_count(&created.id, "alice").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_field_accessors_populate_field_keys() {
        let (service, store) = service();
        let created = service
            .create("alice", doc("t", "First one.\n\nSecond paragraph here!"))
            .await
            .unwrap();

        assert_eq!(service.paragraph_count(&created.id, "alice").await.unwrap(), 2);
        assert_eq!(service.sentence_count(&created.id, "alice").await.unwrap(), 2);
        assert_eq!(
            service.longest_words(&created.id, "alice").await.unwrap(),
            vec!["first".to_string(), "paragraph".to_string()]
        );
        assert!(store.contains_key(&field_key(AnalysisField::ParagraphCount, &created.id)));
        assert!(store.contains_key(&field_key(AnalysisField::LongestWords, &created.id)));
    }

    #[tokio::test]
    async fn test_list_cache_follows_writes() {
        let (service, store) = service();
        let first = service.create("alice", doc("a", "one")).await.unwrap();
        assert!(!store.contains_key(&user_documents_key("alice")));

        assert_eq!(service.list("alice").await.unwrap().len(), 1);
        assert!(store.contains_key(&user_documents_key("alice")));

        let second = service.create("alice", doc("b", "two")).await.unwrap();
        let listed = service.list("alice").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].id, second.id);

        service
            .update(
                &first.id,
                "alice",
                UpdateDocument {
                    title: Some("renamed".to_string()),
                    content: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(service.list("alice").await.unwrap()[0].title, "renamed");

        service.delete(&first.id, "alice").await.unwrap();
        let listed = service.list("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn test_store_outage_still_serves() {
        let (service, store) = service();
        let created = service.create("alice", doc("t", "Hi there.")).await.unwrap();
        store.set_available(false);

        assert_eq!(service.character_count(&created.id, "alice").await.unwrap(), 8);
        assert_eq!(service.list("alice").await.unwrap().len(), 1);
        assert!(!service.cache_health().await);
        assert!(!service.cache_stats().await.connected);
    }
}

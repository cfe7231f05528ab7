// Derived cache behaviour through public APIs
// Author: kelexine (https://github.com/kelexine)

use std::sync::Arc;
use textlens::analysis::{analyze, AnalysisField};
use textlens::cache::keys::{analysis_key, document_keys, field_key, fingerprint_key};
use textlens::cache::{CachedValue, DerivedCache};
use textlens::config::CacheConfig;
use textlens::fingerprint::fingerprint;
use textlens::store::{KeyValueStore, MemoryStore};

const FOX: &str = "The quick brown fox jumps over the lazy dog. The lazy dog slept in the sun.";

fn cache() -> (DerivedCache, MemoryStore) {
    let store = MemoryStore::new();
    (
        DerivedCache::new(Arc::new(store.clone()), CacheConfig::default()),
        store,
    )
}

#[tokio::test]
async fn test_cache_coherence_after_content_change() {
    let (cache, _) = cache();
    let first = analyze(FOX);

    cache.put_full_analysis("doc1", FOX, &first).await;
    assert_eq!(cache.get_full_analysis("doc1", FOX).await, Some(first));

    cache.invalidate_document("doc1").await;
    assert_eq!(cache.get_full_analysis("doc1", "Something else.").await, None);
}

#[tokio::test]
async fn test_drift_self_heals() {
    let (cache, store) = cache();
    cache.put_full_analysis("doc1", FOX, &analyze(FOX)).await;
    cache
        .put_field("doc1", AnalysisField::WordCount, FOX, &16u64)
        .await;

    // No invalidation ran: the stored pair still describes the old content
    assert_eq!(cache.get_full_analysis("doc1", "New text.").await, None);
    for key in document_keys("doc1") {
        assert!(!store.contains_key(&key), "{} survived drift", key);
    }
}

#[tokio::test]
async fn test_updated_document_leaves_no_derived_keys() {
    let (cache, store) = cache();
    let analysis = analyze(FOX);
    assert_eq!(analysis.word_count, 16);

    cache.put_full_analysis("doc1", FOX, &analysis).await;
    assert!(store.contains_key(&analysis_key("doc1")));
    assert!(store.contains_key(&fingerprint_key("doc1")));

    // Content updated to "Updated content here."
    cache.invalidate_document("doc1").await;
    assert_eq!(
        cache.get_full_analysis("doc1", "Updated content here.").await,
        None
    );
    for key in document_keys("doc1") {
        assert!(!store.contains_key(&key));
    }
}

#[tokio::test]
async fn test_fields_do_not_leak() {
    let (cache, _) = cache();
    cache.put_full_analysis("doc1", FOX, &analyze(FOX)).await;
    cache
        .put_field("doc1", AnalysisField::WordCount, FOX, &5u64)
        .await;

    assert_eq!(
        cache
            .get_field::<u64>("doc1", AnalysisField::CharacterCount, FOX)
            .await,
        None
    );
    assert_eq!(
        cache
            .get_field::<u64>("doc1", AnalysisField::WordCount, FOX)
            .await,
        Some(5)
    );
}

#[tokio::test]
async fn test_stale_envelope_is_not_served() {
    let (cache, store) = cache();
    cache.put_full_analysis("doc1", "New text.", &analyze("New text.")).await;

    // A slow writer lands a value computed from the old content
    let stale = CachedValue {
        fingerprint: fingerprint(FOX),
        value: analyze(FOX),
    };
    store
        .set_with_ttl(
            &analysis_key("doc1"),
            &serde_json::to_vec(&stale).unwrap(),
            3600,
        )
        .await
        .unwrap();

    assert_eq!(cache.get_full_analysis("doc1", "New text.").await, None);
}

#[tokio::test]
async fn test_outage_reads_as_miss() {
    let (cache, store) = cache();
    cache.put_full_analysis("doc1", FOX, &analyze(FOX)).await;
    store.set_available(false);

    assert_eq!(cache.get_full_analysis("doc1", FOX).await, None);
    cache.invalidate_document("doc1").await;
    assert!(!cache.ping().await);

    store.set_available(true);
    assert!(cache.ping().await);
    // The failed invalidation left the entries in place
    assert!(store.contains_key(&analysis_key("doc1")));
    assert!(!store.contains_key(&field_key(AnalysisField::WordCount, "doc1")));
}

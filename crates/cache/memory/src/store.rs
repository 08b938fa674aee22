use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use quire_cache::error::CacheError;
use quire_cache::key::CacheKey;
use quire_cache::store::CacheStore;

/// A single entry in the in-memory cache.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    /// Returns `true` if this entry has passed its TTL deadline.
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process [`CacheStore`] backed by a [`DashMap`].
///
/// Entries are lazily evicted on read when their TTL has elapsed. Expired
/// entries that are never read again linger until [`purge_expired`] runs,
/// usually from the background task started by
/// [`spawn_sweeper`](crate::spawn_sweeper).
///
/// Collection generations are kept in a separate map that is never purged.
///
/// [`purge_expired`]: MemoryCacheStore::purge_expired
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    data: DashMap<String, Entry>,
    generations: DashMap<String, u64>,
}

impl MemoryCacheStore {
    /// Create a new, empty in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.data.len())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let rendered = key.canonical();

        // Lazy TTL eviction: check and remove if expired.
        if let Some(entry) = self.data.get(&rendered) {
            if entry.is_expired() {
                drop(entry);
                self.data.remove_if(&rendered, |_, entry| entry.is_expired());
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }

        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.data.insert(
            key.canonical(),
            Entry {
                value: value.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        // Remove, but treat expired entries as "not found".
        match self.data.remove(&key.canonical()) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn generation(&self, collection: &str) -> Result<u64, CacheError> {
        Ok(self.generations.get(collection).map_or(0, |g| *g))
    }

    async fn invalidate_collection(&self, collection: &str) -> Result<u64, CacheError> {
        *self.generations.entry(collection.to_owned()).or_insert(0) += 1;

        let prefix = CacheKey::collection_prefix(collection);
        let mut removed = 0u64;
        self.data.retain(|key, entry| {
            if key.starts_with(&prefix) {
                if !entry.is_expired() {
                    removed += 1;
                }
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use quire_cache::testing::run_cache_conformance_tests;
    use serde_json::json;

    use super::*;

    fn test_key(id: &str) -> CacheKey {
        CacheKey::new("companies", "find_by_id", &json!({ "id": id })).unwrap()
    }

    #[tokio::test]
    async fn conformance() {
        let store = MemoryCacheStore::new();
        run_cache_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_via_get() {
        let store = MemoryCacheStore::new();
        let key = test_key("ttl-expire");

        store
            .set(&key, "short-lived", Duration::from_secs(5))
            .await
            .unwrap();

        // Value should be present before TTL elapses.
        let val = store.get(&key).await.unwrap();
        assert_eq!(val.as_deref(), Some("short-lived"));

        tokio::time::advance(Duration::from_secs(6)).await;

        // Lazy eviction: get should return None and drop the entry.
        let val = store.get(&key).await.unwrap();
        assert!(val.is_none(), "value should be expired");
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn set_refreshes_ttl() {
        let store = MemoryCacheStore::new();
        let key = test_key("refresh");

        store.set(&key, "v1", Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        store.set(&key, "v2", Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;

        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_reclaims_unread_entries() {
        let store = MemoryCacheStore::new();
        store
            .set(&test_key("a"), "a", Duration::from_secs(1))
            .await
            .unwrap();
        store
            .set(&test_key("b"), "b", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.len(), 2);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_of_expired_entry_reports_missing() {
        let store = MemoryCacheStore::new();
        let key = test_key("gone");
        store.set(&key, "x", Duration::from_secs(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.delete(&key).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_counts_only_live_entries() {
        let store = MemoryCacheStore::new();
        store
            .set(&test_key("old"), "x", Duration::from_secs(1))
            .await
            .unwrap();
        store
            .set(&test_key("new"), "y", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        let removed = store.invalidate_collection("companies").await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn generation_survives_purge() {
        let store = MemoryCacheStore::new();
        store.invalidate_collection("companies").await.unwrap();
        store
            .set(&test_key("a"), "a", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.generation("companies").await.unwrap(), 1);
        assert_eq!(store.generation("contacts").await.unwrap(), 0);
    }
}

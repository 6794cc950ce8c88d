use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{CacheBackend, CacheEntry, CacheError, DEFAULT_TTL};

/// Process-local cache; contents are lost on restart.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    store: Arc<DashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            default_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let hit = self.store.get(key).map(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.value.clone())
            }
        });

        match hit {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.store.remove_if(key, |_, entry| entry.is_expired());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl.unwrap_or(self.default_ttl))?;
        self.store.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear();
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before.saturating_sub(self.store.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let cache = InMemoryCache::new();
        cache.set("a", "\"x\"", None).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("\"x\""));
        assert!(cache.exists("a").await.unwrap());

        cache.delete("a").await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_misses_and_removed() {
        let cache = InMemoryCache::new();
        cache.set("stale", "1", Some(Duration::ZERO)).await.unwrap();
        assert_eq!(cache.get("stale").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn purge_counts_removed_entries() {
        let cache = InMemoryCache::new();
        cache.set("stale", "1", Some(Duration::ZERO)).await.unwrap();
        cache.set("fresh", "2", None).await.unwrap();
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.len(), 1);
    }
}

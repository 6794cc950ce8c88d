//! Local JSON cache with an expiration window.
//!
//! Values are opaque JSON strings keyed by string. Each entry records when it
//! was written and when it expires; expired entries read as misses and are
//! removed on access.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::CacheConfig;

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::InMemoryCache;

/// Expiration applied when the caller does not pass one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid TTL")]
    InvalidTTL,
}

/// What is persisted for every key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: &str, value: &str, ttl: Duration) -> Result<Self, CacheError> {
        let created_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| CacheError::InvalidTTL)?;
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or(CacheError::InvalidTTL)?;
        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            created_at,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    /// `ttl: None` uses the backend's default expiration window.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
    /// Drops every expired entry and returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheBackend,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn CacheBackend,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, &raw, ttl).await
}

/// Builds the configured backend; `None` when caching is disabled.
pub async fn build_cache(
    config: &CacheConfig,
) -> Result<Option<Arc<dyn CacheBackend>>, CacheError> {
    if !config.enabled {
        info!("Local cache disabled");
        return Ok(None);
    }

    let backend: Arc<dyn CacheBackend> = match config.backend.to_ascii_lowercase().as_str() {
        "in-memory" => Arc::new(InMemoryCache::with_default_ttl(config.default_ttl())),
        _ => Arc::new(FileCache::new(&config.directory, config.default_ttl()).await?),
    };
    info!(backend = %config.backend, ttl_secs = config.default_ttl_secs, "Local cache ready");
    Ok(Some(backend))
}

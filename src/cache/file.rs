use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CacheBackend, CacheEntry, CacheError, DEFAULT_TTL};

/// One JSON file per key under a cache directory; the file name is the
/// SHA-256 of the key so arbitrary keys map to safe paths.
#[derive(Debug, Clone)]
pub struct FileCache {
    directory: PathBuf,
    default_ttl: Duration,
}

impl FileCache {
    pub async fn new(
        directory: impl AsRef<Path>,
        default_ttl: Duration,
    ) -> Result<Self, CacheError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).await?;
        Ok(Self {
            directory,
            default_ttl,
        })
    }

    pub async fn with_default_ttl(directory: impl AsRef<Path>) -> Result<Self, CacheError> {
        Self::new(directory, DEFAULT_TTL).await
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.directory.join(format!("{}.json", hex::encode(digest)))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<CacheEntry>, CacheError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<CacheEntry>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache file");
                remove_if_present(path).await?;
                Ok(None)
            }
        }
    }

    async fn cache_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut files = Vec::new();
        let mut dir = match fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

async fn remove_if_present(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl CacheBackend for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        match self.read_entry(&path).await? {
            Some(entry) if entry.is_expired() => {
                debug!(key, "cache entry expired");
                remove_if_present(&path).await?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl.unwrap_or(self.default_ttl))?;
        let body = serde_json::to_vec_pretty(&entry)?;

        // Write then rename so readers never observe a partial file.
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, body).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        remove_if_present(&self.path_for(key)).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        for path in self.cache_files().await? {
            remove_if_present(&path).await?;
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let mut removed = 0;
        for path in self.cache_files().await? {
            match self.read_entry(&path).await? {
                Some(entry) if entry.is_expired_at(now) => {
                    remove_if_present(&path).await?;
                    removed += 1;
                }
                _ => {}
            }
        }
        Ok(removed)
    }
}

use std::time::Duration;

use medistock::cache::{get_json, set_json, CacheBackend, FileCache};
use tempfile::TempDir;

#[tokio::test]
async fn entries_are_stored_one_file_per_hashed_key() {
    let dir = TempDir::new().expect("temp dir");
    let cache = FileCache::with_default_ttl(dir.path()).await.expect("cache");

    cache.set("medicines:user-1", "[]", None).await.unwrap();
    let path = cache.path_for("medicines:user-1");
    assert!(path.exists());
    let file_name = path.file_stem().and_then(|s| s.to_str()).unwrap();
    assert_eq!(file_name.len(), 64);

    let raw = std::fs::read_to_string(&path).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["key"], "medicines:user-1");
    assert!(stored["created_at"].is_string());
    assert!(stored["expires_at"].is_string());

    assert_eq!(
        cache.get("medicines:user-1").await.unwrap().as_deref(),
        Some("[]")
    );
}

#[tokio::test]
async fn expired_entries_are_misses_and_get_removed() {
    let dir = TempDir::new().expect("temp dir");
    let cache = FileCache::with_default_ttl(dir.path()).await.expect("cache");

    cache.set("stale", "1", Some(Duration::ZERO)).await.unwrap();
    cache.set("fresh", "2", None).await.unwrap();

    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert!(!cache.path_for("stale").exists());
    assert!(cache.exists("fresh").await.unwrap());

    cache.set("stale", "1", Some(Duration::ZERO)).await.unwrap();
    assert_eq!(cache.get("stale").await.unwrap(), None);
    assert!(!cache.path_for("stale").exists());
}

#[tokio::test]
async fn corrupt_files_are_discarded_and_json_helpers_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let cache = FileCache::with_default_ttl(dir.path()).await.expect("cache");

    std::fs::write(cache.path_for("broken"), b"{not json").unwrap();
    assert_eq!(cache.get("broken").await.unwrap(), None);
    assert!(!cache.path_for("broken").exists());

    set_json(&cache, "numbers", &vec![1, 2, 3], None).await.unwrap();
    let numbers: Option<Vec<i32>> = get_json(&cache, "numbers").await.unwrap();
    assert_eq!(numbers, Some(vec![1, 2, 3]));

    cache.clear().await.unwrap();
    assert!(!cache.exists("numbers").await.unwrap());
}

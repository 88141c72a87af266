//! Directory-backed cache store: one JSON file per key.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::backend::CacheBackend;
use crate::Result;

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    /// Unix milliseconds.
    expires_at: u64,
    data: String,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        now_millis() >= self.expires_at
    }
}

/// File names are the SHA-256 of the key, so any key is a valid name.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = Sha256::digest(key.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<StoredEntry>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<StoredEntry>(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "discarding unreadable cache file");
                remove_quietly(path).await?;
                Ok(None)
            }
        }
    }

    async fn live_entry(&self, key: &str) -> Result<Option<StoredEntry>> {
        let path = self.path_for(key);
        match self.read_entry(&path).await? {
            Some(entry) if entry.key == key && !entry.is_expired() => Ok(Some(entry)),
            Some(entry) if entry.is_expired() => {
                remove_quietly(&path).await?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    async fn cache_files(&self) -> Result<Vec<PathBuf>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl CacheBackend for FileCache {
    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.live_entry(key).await?.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.live_entry(key).await? else {
            return Ok(None);
        };
        match base64::engine::general_purpose::STANDARD.decode(entry.data) {
            Ok(data) => Ok(Some(data)),
            Err(_) => {
                remove_quietly(&self.path_for(key)).await?;
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let entry = StoredEntry {
            key: key.to_string(),
            expires_at: now_millis().saturating_add(ttl.as_millis() as u64),
            data: base64::engine::general_purpose::STANDARD.encode(value),
        };
        let path = self.path_for(key);
        // unique per writer so concurrent puts of one key never share a temp file
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let present = self.live_entry(key).await?.is_some();
        if present {
            remove_quietly(&self.path_for(key)).await?;
        }
        Ok(present)
    }

    async fn clear(&self) -> Result<()> {
        for path in self.cache_files().await? {
            remove_quietly(&path).await?;
        }
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let mut count = 0;
        for path in self.cache_files().await? {
            if let Some(entry) = self.read_entry(&path).await? {
                if !entry.is_expired() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

async fn remove_quietly(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_round_trip_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("gemini"));
        cache.put("gemini_models/gemini-pro_abc", b"{\"x\":1}", HOUR).await.unwrap();

        let reopened = FileCache::new(dir.path().join("gemini"));
        assert!(reopened.has("gemini_models/gemini-pro_abc").await.unwrap());
        assert_eq!(
            reopened.get("gemini_models/gemini-pro_abc").await.unwrap(),
            Some(b"{\"x\":1}".to_vec())
        );
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("never-created"));
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.len().await.unwrap(), 0);
        cache.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.put("k", b"v", Duration::ZERO).await.unwrap();
        assert!(!cache.has("k").await.unwrap());
        assert!(!cache.path_for("k").exists());
    }

    #[tokio::test]
    async fn test_forget_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.put("a", b"1", HOUR).await.unwrap();
        cache.put("b", b"2", HOUR).await.unwrap();
        assert!(cache.forget("a").await.unwrap());
        assert!(!cache.forget("a").await.unwrap());
        cache.clear().await.unwrap();
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_of_one_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = std::sync::Arc::new(FileCache::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.put("k", &[i], HOUR).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stored = cache.get("k").await.unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0] < 8);
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1, "{:?}", names);
        assert!(names[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        std::fs::write(cache.path_for("k"), b"not json").unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}

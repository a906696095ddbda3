//! # Disk Cache Store
//!
//! Persists one pretty-printed JSON file per entry, named `<key>.json`, inside a single
//! cache directory. Each write goes to its own uniquely named `.tmp` file and is then
//! renamed into place, so a concurrent reader sees either the old entry or a complete
//! new one, and concurrent writers never share a temp file. The last rename wins.

use super::{CacheEntry, PlaybookStore};
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

const ENTRY_EXTENSION: &str = "json";

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// File-per-entry cache store
#[derive(Debug, Clone)]
pub struct DiskCache {
    /// Directory holding the entry files
    directory: PathBuf,
}

impl DiskCache {
    /// Create a disk cache rooted at `directory` without touching the filesystem
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Create a disk cache and make sure its directory exists
    ///
    /// A directory that cannot be created is logged and otherwise ignored; every later
    /// write will fail and be skipped by the cache manager.
    pub async fn open(directory: impl Into<PathBuf>) -> Self {
        let cache = Self::new(directory);
        match tokio::fs::create_dir_all(&cache.directory).await {
            Ok(()) => info!("Disk cache ready at {}", cache.directory.display()),
            Err(e) => warn!(
                "Could not create cache directory {}: {} - playbooks will not be persisted",
                cache.directory.display(),
                e
            ),
        }
        cache
    }

    /// Path of the file an entry with `key` is stored in
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", key, ENTRY_EXTENSION))
    }

    /// Temp file for one write: `<key>.<pid>.<seq>.tmp`
    fn temp_path(&self, key: &str) -> PathBuf {
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        self.directory.join(format!("{}.{}.{}.tmp", key, std::process::id(), seq))
    }
}

#[async_trait]
impl PlaybookStore for DiskCache {
    async fn read(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        let path = self.entry_path(key);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let entry = serde_json::from_str(&content)?;
        Ok(Some(entry))
    }

    async fn write(&self, key: &str, entry: &CacheEntry) -> CacheResult<()> {
        let path = self.entry_path(key);
        let tmp_path = self.temp_path(key);
        let body = serde_json::to_string_pretty(entry)?;

        tokio::fs::write(&tmp_path, body)
            .await
            .map_err(|e| CacheError::io(&tmp_path, e))?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(CacheError::io(path, e));
        }

        debug!("Wrote cache entry {}", path.display());
        Ok(())
    }

    async fn entry_count(&self) -> CacheResult<usize> {
        let mut dir = match tokio::fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::io(&self.directory, e)),
        };

        let mut count = 0;
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.directory, e))?
        {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(ENTRY_EXTENSION) {
                count += 1;
            }
        }

        Ok(count)
    }

    fn backend(&self) -> &'static str {
        "disk"
    }
}

//! # In-Memory Cache Store
//!
//! Process-local store backed by a `DashMap`. Entries live until the process exits;
//! expiry is still decided by the cache manager on lookup.

use super::{CacheEntry, PlaybookStore};
use crate::caching::CacheResult;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory cache implementation
#[derive(Debug, Default)]
pub struct InMemoryCache {
    /// Cache entries storage
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCache {
    /// Create an empty in-memory cache
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaybookStore for InMemoryCache {
    async fn read(&self, key: &str) -> CacheResult<Option<CacheEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn write(&self, key: &str, entry: &CacheEntry) -> CacheResult<()> {
        self.entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    async fn entry_count(&self) -> CacheResult<usize> {
        Ok(self.entries.len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

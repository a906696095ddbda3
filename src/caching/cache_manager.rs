//! # Cache Manager
//!
//! The cache manager is the only component the request path talks to. It derives the
//! storage key, applies the retention window, keeps statistics, and absorbs every store
//! fault so that callers only ever see `Option<CacheEntry>` and [`WriteOutcome`].

use super::key_generator::{DefaultKeyGenerator, KeyGenerator};
use super::stores::{CacheEntry, PlaybookStore};
use crate::catalog::OwaspContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Entries older than this are treated as absent
pub const RETENTION_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Result of a best-effort cache write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry was persisted
    Persisted,
    /// The store failed; the failure was logged and ignored
    Skipped,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Store backend name (`disk` or `memory`)
    pub backend: String,

    /// Entries currently held by the store, expired ones included
    pub entries: Option<usize>,

    /// Lookups that returned a live entry
    pub hits: u64,

    /// Lookups that found nothing (or failed to read)
    pub misses: u64,

    /// Lookups that found an entry past the retention window
    pub expired: u64,

    /// Reads that failed and were degraded to a miss
    pub read_errors: u64,

    /// Successful writes
    pub writes: u64,

    /// Writes that failed and were skipped
    pub write_errors: u64,

    /// Hit ratio over all lookups
    pub hit_ratio: f64,

    /// Retention window in seconds
    pub retention_secs: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    read_errors: AtomicU64,
    writes: AtomicU64,
    write_errors: AtomicU64,
}

/// Fail-open playbook cache
pub struct CacheManager {
    /// Storage backend
    store: Arc<dyn PlaybookStore>,

    /// Key derivation strategy
    key_generator: Arc<dyn KeyGenerator>,

    /// Statistics counters
    counters: Counters,
}

impl CacheManager {
    /// Create a cache manager over `store` with the default key generator
    pub fn new(store: Arc<dyn PlaybookStore>) -> Self {
        Self::with_key_generator(store, Arc::new(DefaultKeyGenerator))
    }

    /// Create a cache manager with a custom key generator
    pub fn with_key_generator(
        store: Arc<dyn PlaybookStore>,
        key_generator: Arc<dyn KeyGenerator>,
    ) -> Self {
        Self {
            store,
            key_generator,
            counters: Counters::default(),
        }
    }

    /// Storage key for a category
    pub fn key_for(&self, category: &str) -> String {
        self.key_generator.generate_key(category)
    }

    /// Return the live entry for `category`, or `None`
    ///
    /// Missing, expired and unreadable entries all come back as `None`.
    pub async fn lookup(&self, category: &str) -> Option<CacheEntry> {
        self.lookup_at(category, Utc::now()).await
    }

    /// [`lookup`](Self::lookup) evaluated at an explicit point in time
    pub async fn lookup_at(&self, category: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let key = self.key_for(category);

        match self.store.read(&key).await {
            Ok(Some(entry)) if entry.is_expired_at(now, RETENTION_WINDOW) => {
                self.counters.expired.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                info!("Cache expired for vulnerability: {}", category);
                None
            }
            Ok(Some(entry)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                info!("Cache hit for vulnerability: {}", category);
                Some(entry)
            }
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                info!("Cache miss for vulnerability: {}", category);
                None
            }
            Err(e) => {
                self.counters.read_errors.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                error!(
                    backend = self.store.backend(),
                    "Error reading cache for vulnerability {}: {}", category, e
                );
                None
            }
        }
    }

    /// Persist a freshly generated playbook, replacing any previous entry
    ///
    /// Never fails: a store error is logged and reported as [`WriteOutcome::Skipped`].
    pub async fn store(
        &self,
        category: &str,
        content: &str,
        context: OwaspContext,
    ) -> WriteOutcome {
        let entry = CacheEntry::new(category, content, context);
        self.store_entry(&entry).await
    }

    /// Persist a prepared entry under its category's key
    pub async fn store_entry(&self, entry: &CacheEntry) -> WriteOutcome {
        let key = self.key_for(&entry.category);

        match self.store.write(&key, entry).await {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                info!("Saved to cache: {}", entry.category);
                WriteOutcome::Persisted
            }
            Err(e) => {
                self.counters.write_errors.fetch_add(1, Ordering::Relaxed);
                error!(
                    backend = self.store.backend(),
                    "Error saving cache for vulnerability {}: {}", entry.category, e
                );
                WriteOutcome::Skipped
            }
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        let entries = match self.store.entry_count().await {
            Ok(count) => Some(count),
            Err(e) => {
                error!("Could not count cache entries: {}", e);
                None
            }
        };

        CacheStats {
            backend: self.store.backend().to_string(),
            entries,
            hits,
            misses,
            expired: self.counters.expired.load(Ordering::Relaxed),
            read_errors: self.counters.read_errors.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            write_errors: self.counters.write_errors.load(Ordering::Relaxed),
            hit_ratio: if lookups > 0 {
                hits as f64 / lookups as f64
            } else {
                0.0
            },
            retention_secs: RETENTION_WINDOW.as_secs(),
        }
    }
}

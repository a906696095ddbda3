//! # Cache Stores Module
//!
//! This module provides the storage backends for playbook entries: a file-per-entry
//! disk store and a process-local in-memory store.

pub mod disk;
pub mod memory;

pub use disk::DiskCache;
pub use memory::InMemoryCache;

use super::CacheResult;
use crate::catalog::OwaspContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One persisted generation result
///
/// The serialized field names are the on-disk format:
/// `{vulnerability, playbook, owasp_context, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Category label the playbook was generated for
    #[serde(rename = "vulnerability")]
    pub category: String,

    /// Generated markdown body
    #[serde(rename = "playbook")]
    pub content: String,

    /// Reference metadata attached at generation time
    #[serde(rename = "owasp_context")]
    pub context: OwaspContext,

    /// When the entry was created
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new cache entry stamped with the current time
    pub fn new(
        category: impl Into<String>,
        content: impl Into<String>,
        context: OwaspContext,
    ) -> Self {
        Self::with_created_at(category, content, context, Utc::now())
    }

    /// Create a cache entry with an explicit creation time
    pub fn with_created_at(
        category: impl Into<String>,
        content: impl Into<String>,
        context: OwaspContext,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category: category.into(),
            content: content.into(),
            context,
            created_at,
        }
    }

    /// Age of the entry at `now`; negative when `created_at` lies in the future
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }

    /// An entry is live while its age is strictly below the retention window
    pub fn is_expired_at(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        match chrono::Duration::from_std(retention) {
            Ok(retention) => self.age_at(now) >= retention,
            Err(_) => false,
        }
    }
}

/// Trait for playbook store implementations
///
/// Stores are dumb key-value backends: they report every fault as an error and know
/// nothing about expiry. The fail-open policy lives in
/// [`CacheManager`](super::CacheManager).
#[async_trait]
pub trait PlaybookStore: Send + Sync {
    /// Read the entry stored under `key`, if any
    async fn read(&self, key: &str) -> CacheResult<Option<CacheEntry>>;

    /// Write `entry` under `key`, replacing whatever was there
    async fn write(&self, key: &str, entry: &CacheEntry) -> CacheResult<()>;

    /// Number of entries currently held, expired ones included
    async fn entry_count(&self) -> CacheResult<usize>;

    /// Short backend name for logs and stats
    fn backend(&self) -> &'static str;
}

//! # Caching System Module
//!
//! This module persists generated playbooks so that each category is only sent to the
//! text-generation service once per retention window.
//!
//! ## Architecture
//! The caching system follows a layered approach:
//! 1. **Key Generator**: derives a fixed-length storage key from a category label
//! 2. **Cache Stores**: a file-per-entry disk store and an in-memory store, both behind
//!    the [`PlaybookStore`] trait; stores report every fault as a [`CacheError`]
//! 3. **Cache Manager**: applies the fixed retention window lazily on lookup and turns
//!    every store fault into "absent" (reads) or "skipped" (writes)
//!
//! Nothing in this module can make a request fail. A broken cache directory only means
//! every request regenerates its playbook.
//!
//! ## Usage Example
//! ```rust,ignore
//! use owasp_playbook::caching::{CacheManager, InMemoryCache};
//! use owasp_playbook::catalog::OwaspContext;
//!
//! let cache = CacheManager::new(Arc::new(InMemoryCache::new()));
//! cache.store("LLM09:2025 Misinformation", "# Playbook", OwaspContext::fallback()).await;
//!
//! if let Some(entry) = cache.lookup("LLM09:2025 Misinformation").await {
//!     println!("{}", entry.content);
//! }
//! ```

pub mod cache_manager;
pub mod key_generator;
pub mod stores;

pub use cache_manager::{CacheManager, CacheStats, WriteOutcome, RETENTION_WINDOW};
pub use key_generator::{derive_cache_key, DefaultKeyGenerator, KeyGenerator, CACHE_KEY_LEN};
pub use stores::{CacheEntry, DiskCache, InMemoryCache, PlaybookStore};

use std::path::PathBuf;

/// Cache operation result
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache store error: {message}")]
    Store { message: String },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

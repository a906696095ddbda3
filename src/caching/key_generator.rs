//! # Cache Key Generator
//!
//! Derives the storage key for a playbook from its category label.
//!
//! The key is the lowercase hex SHA-256 digest of the label's UTF-8 bytes, so it is
//! always 64 characters long, safe to use as a file name, and identical across
//! restarts. Cryptographic strength is not required here; a well-distributed,
//! deterministic digest is.

use sha2::{Digest, Sha256};

/// Length of every derived key, in characters
pub const CACHE_KEY_LEN: usize = 64;

/// Cache key generator trait
pub trait KeyGenerator: Send + Sync {
    /// Generate a storage key for a category label
    fn generate_key(&self, category: &str) -> String;
}

/// Default key generator: SHA-256 over the label, hex encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyGenerator;

impl KeyGenerator for DefaultKeyGenerator {
    fn generate_key(&self, category: &str) -> String {
        derive_cache_key(category)
    }
}

/// Derive the fixed-length cache key for a category label
pub fn derive_cache_key(category: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_bytes());
    hex::encode(hasher.finalize())
}

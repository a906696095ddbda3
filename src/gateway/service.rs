//! # Playbook Service
//!
//! Validates the requested category, serves it from the cache when a live entry exists,
//! and otherwise generates, stores and returns a fresh playbook.
//!
//! Concurrent misses for the same category can be collapsed onto one generation call.
//! Each category gets its own async lock. Whoever holds it re-checks the cache, then
//! looks at the result of the attempt that finished while it was queued: waiters reuse
//! that attempt's playbook or its error instead of calling the generator again. A
//! request that arrives after a failed attempt has completed starts a new one.

use crate::caching::CacheManager;
use crate::catalog::{self, OwaspContext};
use crate::core::error::{PlaybookError, PlaybookResult};
use crate::generation::{ContextProvider, PlaybookGenerator};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

/// A playbook as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybookOutcome {
    /// Markdown body
    pub playbook: String,

    /// Reference metadata for the category
    pub owasp_context: OwaspContext,

    /// Whether the body came from the cache
    pub cached: bool,

    /// Creation time of the cached entry; absent for fresh playbooks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Get-or-generate orchestration over the cache and the generator
pub struct PlaybookService {
    cache: Arc<CacheManager>,
    generator: Arc<dyn PlaybookGenerator>,
    context: ContextProvider,
    single_flight: bool,
    in_flight: DashMap<String, Arc<Mutex<Flight>>>,
}

/// Last completed generation attempt for one category
#[derive(Default)]
struct Flight {
    finished: Option<(Instant, PlaybookResult<PlaybookOutcome>)>,
}

impl PlaybookService {
    pub fn new(
        cache: Arc<CacheManager>,
        generator: Arc<dyn PlaybookGenerator>,
        context: ContextProvider,
    ) -> Self {
        Self {
            cache,
            generator,
            context,
            single_flight: true,
            in_flight: DashMap::new(),
        }
    }

    /// Enable or disable collapsing of concurrent misses
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Return the playbook for `category`, generating it on a cache miss
    ///
    /// Unknown categories are rejected before the cache is touched. A generation failure
    /// leaves the cache unchanged.
    #[instrument(skip(self))]
    pub async fn get_or_generate(&self, category: &str) -> PlaybookResult<PlaybookOutcome> {
        if category.is_empty() {
            return Err(PlaybookError::MissingCategory);
        }
        if !catalog::contains(category) {
            return Err(PlaybookError::invalid_category(category));
        }

        if let Some(outcome) = self.cached(category).await {
            return Ok(outcome);
        }

        if !self.single_flight {
            return self.generate_and_store(category).await;
        }

        let lock = self
            .in_flight
            .entry(category.to_string())
            .or_default()
            .clone();
        let queued_at = Instant::now();
        let mut flight = lock.lock().await;

        if let Some(outcome) = self.cached(category).await {
            debug!("Served {} from a concurrent generation", category);
            return Ok(outcome);
        }

        // The cache write may have been skipped, or the attempt may have failed.
        if let Some((finished_at, result)) = &flight.finished {
            if *finished_at >= queued_at {
                debug!("Reusing concurrent generation result for {}", category);
                return result.clone();
            }
        }

        let result = self.generate_and_store(category).await;
        flight.finished = Some((Instant::now(), result.clone()));
        result
    }

    async fn cached(&self, category: &str) -> Option<PlaybookOutcome> {
        self.cache.lookup(category).await.map(|entry| PlaybookOutcome {
            playbook: entry.content,
            owasp_context: entry.context,
            cached: true,
            timestamp: Some(entry.created_at),
        })
    }

    async fn generate_and_store(&self, category: &str) -> PlaybookResult<PlaybookOutcome> {
        let owasp_context = self.context.fetch(category).await;

        info!("Generating playbook for {} with {}", category, self.generator.name());
        let playbook = self
            .generator
            .generate(category, &owasp_context)
            .await
            .map_err(|e| {
                error!("Error generating playbook for {}: {}", category, e);
                PlaybookError::from_generation(category, &e)
            })?;

        // A failed write is already logged by the cache manager.
        self.cache
            .store(category, &playbook, owasp_context.clone())
            .await;

        Ok(PlaybookOutcome {
            playbook,
            owasp_context,
            cached: false,
            timestamp: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caching::InMemoryCache;
    use crate::generation::{GenerationError, GenerationResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LABEL: &str = "LLM02:2025 Sensitive Information Disclosure";

    struct CountingGenerator {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingGenerator {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl PlaybookGenerator for CountingGenerator {
        async fn generate(
            &self,
            category: &str,
            _context: &OwaspContext,
        ) -> GenerationResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.fail {
                Err(GenerationError::Network("connection refused".to_string()))
            } else {
                Ok(format!("# {}\n\nMitigations", category))
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn service(generator: Arc<CountingGenerator>) -> PlaybookService {
        let cache = Arc::new(CacheManager::new(Arc::new(InMemoryCache::new())));
        PlaybookService::new(cache, generator, ContextProvider::new())
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let generator = CountingGenerator::new(false);
        let service = service(generator.clone());

        let first = service.get_or_generate(LABEL).await.unwrap();
        assert!(!first.cached);
        assert!(first.timestamp.is_none());

        let second = service.get_or_generate(LABEL).await.unwrap();
        assert!(second.cached);
        assert!(second.timestamp.is_some());
        assert_eq!(first.playbook, second.playbook);
        assert_eq!(first.owasp_context, second.owasp_context);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_category_touches_nothing() {
        let generator = CountingGenerator::new(false);
        let service = service(generator.clone());

        let err = service.get_or_generate("LLM11:2025 Made Up").await.unwrap_err();
        assert!(matches!(err, PlaybookError::InvalidCategory { .. }));

        let err = service.get_or_generate("").await.unwrap_err();
        assert!(matches!(err, PlaybookError::MissingCategory));

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.cache().stats().await.entries, Some(0));
    }

    #[tokio::test]
    async fn test_generation_failure_writes_nothing() {
        let generator = CountingGenerator::new(true);
        let service = service(generator);

        let err = service.get_or_generate(LABEL).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Failed to generate playbook:"));
        assert_eq!(service.cache().stats().await.entries, Some(0));
    }

    #[tokio::test]
    async fn test_single_flight_collapses_concurrent_misses() {
        let generator = CountingGenerator::new(false);
        let service = Arc::new(service(generator.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.get_or_generate(LABEL).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_flight_shares_failure_with_waiters() {
        let generator = CountingGenerator::new(true);
        let service = Arc::new(service(generator.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.get_or_generate(LABEL).await })
            })
            .collect();

        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert!(matches!(err, PlaybookError::Generation { .. }));
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        // A request arriving after the failed attempt tries again.
        assert!(service.get_or_generate(LABEL).await.is_err());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_flight_shares_playbook_when_cache_write_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, "occupied").unwrap();

        let generator = CountingGenerator::new(false);
        let store = Arc::new(crate::caching::DiskCache::new(blocker));
        let cache = Arc::new(CacheManager::new(store));
        let service = PlaybookService::new(cache, generator.clone(), ContextProvider::new());

        let (a, b, c) = tokio::join!(
            service.get_or_generate(LABEL),
            service.get_or_generate(LABEL),
            service.get_or_generate(LABEL)
        );

        let playbook = a.unwrap().playbook;
        assert_eq!(b.unwrap().playbook, playbook);
        assert_eq!(c.unwrap().playbook, playbook);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_without_single_flight_every_miss_generates() {
        let generator = CountingGenerator::new(false);
        let service = Arc::new(service(generator.clone()).with_single_flight(false));

        let (a, b) = tokio::join!(service.get_or_generate(LABEL), service.get_or_generate(LABEL));
        assert!(!a.unwrap().cached);
        assert!(!b.unwrap().cached);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }
}

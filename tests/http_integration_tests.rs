//! # HTTP Integration Tests
//!
//! Drives the full router in-process with `axum-test`, backed by an in-memory cache and
//! a stub generator that counts its calls.

use async_trait::async_trait;
use axum::http::StatusCode;
use owasp_playbook::caching::{CacheManager, CacheStats, InMemoryCache};
use owasp_playbook::catalog::{self, OwaspContext};
use owasp_playbook::generation::{
    ContextProvider, GenerationError, GenerationResult, PlaybookGenerator,
};
use owasp_playbook::{build_router, AppState, PlaybookService};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const LABEL: &str = "LLM01:2025 Prompt Injection";
const ENCODED_LABEL: &str = "LLM01:2025%20Prompt%20Injection";

struct StubGenerator {
    calls: AtomicUsize,
    fail: bool,
    delay: Duration,
}

impl StubGenerator {
    fn new(fail: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
            delay,
        })
    }

    fn working() -> Arc<Self> {
        Self::new(false, Duration::from_millis(50))
    }

    fn failing() -> Arc<Self> {
        Self::new(true, Duration::from_millis(50))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaybookGenerator for StubGenerator {
    async fn generate(
        &self,
        category: &str,
        _context: &OwaspContext,
    ) -> GenerationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(GenerationError::Api {
                status: 429,
                message: "Rate limit reached".to_string(),
            });
        }
        Ok(format!(
            concat!(
                "# {} Playbook\n\n## Mitigations\n\n",
                "| Control | Owner |\n|---|---|\n| Input filtering | AppSec |\n"
            ),
            category
        ))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

struct Harness {
    server: TestServer,
    generator: Arc<StubGenerator>,
    cache: Arc<CacheManager>,
}

fn harness_with(generator: Arc<StubGenerator>, index_file: PathBuf) -> Harness {
    harness_with_timeout(generator, index_file, Duration::from_secs(30))
}

fn harness_with_timeout(
    generator: Arc<StubGenerator>,
    index_file: PathBuf,
    request_timeout: Duration,
) -> Harness {
    let cache = Arc::new(CacheManager::new(Arc::new(InMemoryCache::new())));
    let service = PlaybookService::new(cache.clone(), generator.clone(), ContextProvider::new());
    let state = AppState::new(Arc::new(service), index_file).unwrap();
    let server = TestServer::new(build_router(state, request_timeout)).unwrap();

    Harness {
        server,
        generator,
        cache,
    }
}

fn harness() -> Harness {
    harness_with(StubGenerator::working(), PathBuf::from("does-not-exist/index.html"))
}

#[tokio::test]
async fn test_list_vulnerabilities() {
    let h = harness();

    let response = h.server.get("/vulnerabilities").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let labels: Vec<String> = response.json();
    assert_eq!(labels.len(), 10);
    assert_eq!(labels, catalog::labels());
    assert_eq!(labels[0], LABEL);
    assert_eq!(labels[9], "LLM10:2025 Unbounded Consumption");
}

#[tokio::test]
async fn test_generate_then_cached() {
    let h = harness();

    let first = h
        .server
        .post("/generate_playbook")
        .json(&json!({ "vulnerability": LABEL }))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let first: Value = first.json();
    assert_eq!(first["cached"], false);
    assert!(first.get("timestamp").is_none());
    assert_eq!(
        first["owasp_context"]["url"],
        "https://genai.owasp.org/llmrisk/llm01-prompt-injection/"
    );

    let second = h
        .server
        .post("/generate_playbook")
        .json(&json!({ "vulnerability": LABEL }))
        .await;
    assert_eq!(second.status_code(), StatusCode::OK);
    let second: Value = second.json();
    assert_eq!(second["cached"], true);
    assert!(second["timestamp"].as_str().is_some());
    assert_eq!(first["playbook"], second["playbook"]);
    assert_eq!(first["owasp_context"], second["owasp_context"]);

    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn test_missing_vulnerability() {
    let h = harness();

    for body in [json!({}), json!({ "vulnerability": "" }), json!({ "other": 1 })] {
        let response = h.server.post("/generate_playbook").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], "Missing vulnerability");
    }

    let response = h.server.post("/generate_playbook").text("not json").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["error"], "Missing vulnerability");

    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_invalid_vulnerability_has_no_side_effects() {
    let h = harness();

    let response = h
        .server
        .post("/generate_playbook")
        .json(&json!({ "vulnerability": "LLM11:2025 Not Real" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["error"], "Invalid vulnerability: LLM11:2025 Not Real");

    let response = h.server.get("/export_markdown/LLM11:2025%20Not%20Real").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = h.server.get("/export_pdf/not-a-category").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["error"], "Invalid vulnerability: not-a-category");

    assert_eq!(h.generator.calls(), 0);
    assert_eq!(h.cache.stats().await.entries, Some(0));
}

#[tokio::test]
async fn test_export_markdown() {
    let h = harness();

    let response = h.server.get(&format!("/export_markdown/{}", ENCODED_LABEL)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        "text/markdown; charset=utf-8"
    );
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"LLM01:2025_Prompt_Injection_Playbook.md\""
    );
    assert!(response.text().starts_with("# LLM01:2025 Prompt Injection Playbook"));

    // The export reuses the cached playbook.
    h.server.get(&format!("/export_markdown/{}", ENCODED_LABEL)).await;
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn test_export_pdf_page() {
    let h = harness();

    let response = h.server.get(&format!("/export_pdf/{}", ENCODED_LABEL)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "text/html; charset=utf-8");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"LLM01:2025_Prompt_Injection_Playbook.html\""
    );

    let page = response.text();
    assert!(page.contains("<h2>LLM01:2025 Prompt Injection - Security Playbook</h2>"));
    assert!(page.contains("<h2>Mitigations</h2>"));
    assert!(page.contains("<table>"));
    assert!(page.contains("Generated on "));
}

#[tokio::test]
async fn test_generation_failure_returns_500_and_caches_nothing() {
    let h = harness_with(StubGenerator::failing(), PathBuf::from("index.html"));

    let response = h
        .server
        .post("/generate_playbook")
        .json(&json!({ "vulnerability": LABEL }))
        .await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = response.json();
    let message = error["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to generate playbook:"));
    assert!(message.contains("Rate limit reached"));

    let response = h.server.get(&format!("/export_markdown/{}", ENCODED_LABEL)).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(h.cache.stats().await.entries, Some(0));
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_misses_share_one_generation() {
    let h = harness();

    let requests = (0..6).map(|_| {
        h.server
            .post("/generate_playbook")
            .json(&json!({ "vulnerability": LABEL }))
            .into_future()
    });
    let responses = futures::future::join_all(requests).await;

    let playbooks: Vec<Value> = responses
        .iter()
        .map(|response| {
            assert_eq!(response.status_code(), StatusCode::OK);
            response.json::<Value>()["playbook"].clone()
        })
        .collect();

    assert!(playbooks.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_failures_share_one_generation() {
    let h = harness_with(StubGenerator::failing(), PathBuf::from("index.html"));

    let requests = (0..6).map(|_| {
        h.server
            .post("/generate_playbook")
            .json(&json!({ "vulnerability": LABEL }))
            .into_future()
    });
    let responses = futures::future::join_all(requests).await;

    for response in &responses {
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = response.json();
        assert!(error["error"].as_str().unwrap().contains("Rate limit reached"));
    }
    assert_eq!(h.generator.calls(), 1);
    assert_eq!(h.cache.stats().await.entries, Some(0));
}

#[tokio::test]
async fn test_slow_generation_times_out_with_json_error() {
    let generator = StubGenerator::new(false, Duration::from_millis(500));
    let h = harness_with_timeout(
        generator,
        PathBuf::from("index.html"),
        Duration::from_millis(100),
    );

    let response = h
        .server
        .post("/generate_playbook")
        .json(&json!({ "vulnerability": LABEL }))
        .await;

    assert_eq!(response.status_code(), StatusCode::GATEWAY_TIMEOUT);
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let error: Value = response.json();
    assert_eq!(error["error"], "Request timed out after 100ms");

    // Fast endpoints are unaffected.
    let response = h.server.get("/vulnerabilities").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_stats() {
    let h = harness();

    let response = h.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "status": "ok", "categories": 10 }));

    h.server
        .post("/generate_playbook")
        .json(&json!({ "vulnerability": LABEL }))
        .await;
    h.server
        .post("/generate_playbook")
        .json(&json!({ "vulnerability": LABEL }))
        .await;

    let stats: CacheStats = h.server.get("/cache/stats").await.json();
    assert_eq!(stats.backend, "memory");
    assert_eq!(stats.entries, Some(1));
    assert_eq!(stats.writes, 1);
    assert!(stats.hits >= 1);
    assert_eq!(stats.retention_secs, 7 * 24 * 60 * 60);
}

#[tokio::test]
async fn test_index_page() {
    let dir = tempfile::TempDir::new().unwrap();
    let index = dir.path().join("index.html");
    std::fs::write(&index, "<html><body>Playbook Generator</body></html>").unwrap();

    let h = harness_with(StubGenerator::working(), index);
    let response = h.server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Playbook Generator"));

    let missing = harness();
    let response = missing.server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_cors_is_permissive() {
    let h = harness();

    let response = h
        .server
        .get("/vulnerabilities")
        .add_header(
            axum::http::HeaderName::from_static("origin"),
            axum::http::HeaderValue::from_static("http://localhost:3000"),
        )
        .await;
    assert_eq!(response.header("access-control-allow-origin"), "*");
}

//! # HTTP Server Module
//!
//! Builds the axum router over [`AppState`] and runs it until a shutdown signal arrives.
//!
//! Layers, innermost first: request timeout, permissive CORS (the browser frontend may be
//! served from anywhere), and `TraceLayer` request spans. A request that outlives the
//! timeout gets the usual JSON error body with status 504.

use super::handlers;
use super::service::PlaybookService;
use crate::core::error::{PlaybookError, PlaybookResult};
use crate::rendering::PageRenderer;
use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::{BoxError, ServiceBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Get-or-generate orchestration
    pub service: Arc<PlaybookService>,

    /// Export page renderer
    pub renderer: Arc<PageRenderer>,

    /// Frontend page served at `/`
    pub index_file: PathBuf,
}

impl AppState {
    pub fn new(
        service: Arc<PlaybookService>,
        index_file: impl Into<PathBuf>,
    ) -> PlaybookResult<Self> {
        Ok(Self {
            service,
            renderer: Arc::new(PageRenderer::new()?),
            index_file: index_file.into(),
        })
    }
}

/// Router with every endpoint and the standard layers
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/vulnerabilities", get(handlers::list_vulnerabilities))
        .route("/generate_playbook", post(handlers::generate_playbook))
        .route("/export_markdown/:vulnerability", get(handlers::export_markdown))
        .route("/export_pdf/:vulnerability", get(handlers::export_pdf))
        .route("/health", get(handlers::health))
        .route("/cache/stats", get(handlers::cache_stats))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    timeout_error(err, request_timeout)
                }))
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

fn timeout_error(err: BoxError, request_timeout: Duration) -> PlaybookError {
    if err.is::<Elapsed>() {
        warn!(
            "Request exceeded {}",
            humantime::format_duration(request_timeout)
        );
        PlaybookError::Timeout {
            timeout: request_timeout,
        }
    } else {
        PlaybookError::internal(format!("Unhandled middleware error: {}", err))
    }
}

/// Playbook HTTP server
pub struct PlaybookServer {
    app: Router,
    bind_addr: SocketAddr,
}

impl PlaybookServer {
    pub fn new(state: AppState, bind_addr: SocketAddr, request_timeout: Duration) -> Self {
        Self {
            app: build_router(state, request_timeout),
            bind_addr,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Serve until `shutdown` completes, then drain in-flight requests
    #[instrument(skip(self, shutdown))]
    pub async fn start<F>(self, shutdown: F) -> PlaybookResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr).await.map_err(|e| {
            PlaybookError::internal(format!("Failed to bind server to {}: {}", self.bind_addr, e))
        })?;

        info!("Playbook server listening on {}", self.bind_addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| PlaybookError::internal(format!("Server error: {}", e)))?;

        info!("Playbook server stopped");
        Ok(())
    }
}

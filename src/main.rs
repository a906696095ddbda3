//! # OWASP LLM Playbook Service - Main Entry Point
//!
//! Startup sequence: load configuration, initialize logging, open the cache, build the
//! generator, then serve until SIGINT or SIGTERM.

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use owasp_playbook::caching::{CacheManager, DiskCache, InMemoryCache, PlaybookStore};
use owasp_playbook::core::config::{AppConfig, CacheBackend};
use owasp_playbook::generation::context::PROBE_TIMEOUT;
use owasp_playbook::generation::{ContextProvider, OpenAiGenerator};
use owasp_playbook::observability::init_logging;
use owasp_playbook::{AppState, PlaybookError, PlaybookResult, PlaybookServer, PlaybookService};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be up yet when configuration fails.
        eprintln!("owasp-playbook failed to start: {}", e);
        error!("Failed to start playbook service: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> PlaybookResult<()> {
    let config = AppConfig::load().await?;
    init_logging(&config.logging)?;

    info!("Starting OWASP LLM playbook service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = build_server(&config).await?;
    info!("Playbook service ready on {}", server.bind_addr());

    server.start(shutdown_signal()).await?;

    info!("Playbook service shutdown complete");
    Ok(())
}

async fn build_server(config: &AppConfig) -> PlaybookResult<PlaybookServer> {
    let store: Arc<dyn PlaybookStore> = match config.cache.backend {
        CacheBackend::Disk => {
            info!("Using disk cache at {}", config.cache.directory.display());
            Arc::new(DiskCache::open(config.cache.directory.clone()).await)
        }
        CacheBackend::Memory => {
            info!("Using in-memory cache");
            Arc::new(InMemoryCache::new())
        }
    };
    let cache = Arc::new(CacheManager::new(store));

    let generator_config = config.generator.openai();
    if generator_config.api_key.as_deref().map_or(true, str::is_empty) {
        warn!("OPENAI_API_KEY is not set; generation requests will fail until it is");
    }
    let generator = OpenAiGenerator::new(generator_config)
        .map_err(|e| PlaybookError::config(format!("Failed to create generator: {}", e)))?;
    info!(
        "Generator: model {} at {} (timeout {})",
        config.generator.model,
        generator.endpoint(),
        humantime::format_duration(config.generator.timeout)
    );

    let context = if config.generator.probe_references {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| PlaybookError::config(format!("Failed to create probe client: {}", e)))?;
        ContextProvider::with_probe(client)
    } else {
        ContextProvider::new()
    };

    let service = PlaybookService::new(cache, Arc::new(generator), context)
        .with_single_flight(config.generator.single_flight);

    let state = AppState::new(Arc::new(service), config.server.index_file.clone())?;
    let bind_addr = config.server.socket_addr()?;

    Ok(PlaybookServer::new(
        state,
        bind_addr,
        config.server.request_timeout,
    ))
}

/// Resolves on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install SIGINT handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

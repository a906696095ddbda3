//! # Structured Logging
//!
//! Installs the global tracing subscriber. `RUST_LOG` wins over the configured level.
//! Output is JSON by default, or human-readable text when `logging.format` is `pretty`.

use crate::core::config::LoggingConfig;
use crate::core::error::{PlaybookError, PlaybookResult};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(value: &str) -> PlaybookResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(PlaybookError::config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Filter from `RUST_LOG`, or from the configured level when it is unset or invalid
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber
///
/// Calling this twice is harmless: the second call logs a warning and keeps the
/// existing subscriber.
pub fn init_logging(config: &LoggingConfig) -> PlaybookResult<()> {
    let format = LogFormat::parse(&config.format)?;
    let env_filter = build_env_filter(config);

    let result = match format {
        LogFormat::Json => Registry::default()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init(),
        LogFormat::Pretty => Registry::default()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
    };

    if result.is_err() {
        warn!("Tracing subscriber already initialized, skipping initialization");
    }

    info!(log_format = ?format, "Structured logging initialized");
    Ok(())
}

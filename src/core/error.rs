//! # Error Handling Module
//!
//! This module defines the application-level error type for the playbook service using
//! the `thiserror` crate, and maps every variant to the HTTP status a client receives.
//!
//! ## Error Taxonomy
//!
//! Only two kinds of failure are ever visible to API clients:
//! - **Invalid input**: a category outside the fixed catalog (or no category at all).
//!   These map to `400 Bad Request` and have no side effects.
//! - **Generation failures**: the text-generation service could not produce a playbook.
//!   These map to `500 Internal Server Error` and no cache entry is written.
//! - **Timeouts**: the request outlived `server.request_timeout` (`504 Gateway Timeout`).
//!
//! Cache I/O failures have their own type ([`crate::caching::CacheError`]) and never
//! reach this enum on the request path: the cache layer logs them and degrades to a
//! miss (reads) or a no-op (writes).
//!
//! ### The `?` Operator
//! Internal helpers return `PlaybookResult<T>` so they can propagate with `?`:
//! ```rust,ignore
//! fn parse(content: &str) -> PlaybookResult<AppConfig> {
//!     let config = serde_yaml::from_str(content)?; // serde_yaml::Error -> PlaybookError
//!     Ok(config)
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::generation::GenerationError;

/// Main result type used throughout the service
pub type PlaybookResult<T> = Result<T, PlaybookError>;

/// Application error types
///
/// The `#[error("...")]` attribute from `thiserror` implements `Display`; the rendered
/// message is exactly what ends up in the `{"error": ...}` response body.
#[derive(Debug, Error, Clone)]
pub enum PlaybookError {
    /// The request did not name a category
    #[error("Missing vulnerability")]
    MissingCategory,

    /// The request named a category outside the fixed catalog
    #[error("Invalid vulnerability: {label}")]
    InvalidCategory { label: String },

    /// The text-generation service failed for a category
    #[error("Failed to generate playbook: {message}")]
    Generation { category: String, message: String },

    /// Configuration-related errors (invalid config, unreadable file, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Template rendering errors for exported pages
    #[error("Template error: {message}")]
    Template { message: String },

    /// The request did not finish within the server's request timeout
    #[error("Request timed out after {}", humantime::format_duration(*timeout))]
    Timeout { timeout: std::time::Duration },

    /// Requested resource does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Internal server errors for unexpected failures
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl PlaybookError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid category error
    pub fn invalid_category<S: Into<String>>(label: S) -> Self {
        Self::InvalidCategory {
            label: label.into(),
        }
    }

    /// Create a generation error for a category
    pub fn generation<C: Into<String>, M: Into<String>>(category: C, message: M) -> Self {
        Self::Generation {
            category: category.into(),
            message: message.into(),
        }
    }

    /// Wrap a generator failure for the category it was requested for
    pub fn from_generation(category: &str, err: &GenerationError) -> Self {
        Self::generation(category, err.to_string())
    }

    /// Create an internal error with a custom message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a not found error with a custom message
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCategory => StatusCode::BAD_REQUEST,
            Self::InvalidCategory { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Generation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Template { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_yaml::Error> for PlaybookError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Configuration {
            message: format!("Failed to parse config: {}", err),
        }
    }
}

impl From<tera::Error> for PlaybookError {
    fn from(err: tera::Error) -> Self {
        Self::Template {
            message: err.to_string(),
        }
    }
}

/// Converts errors into `{"error": "<message>"}` JSON responses
impl IntoResponse for PlaybookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({ "error": self.to_string() });

        (status, Json(body)).into_response()
    }
}

//! # Observability Module
//!
//! Logging setup for the service. Request spans come from `tower_http::trace::TraceLayer`
//! in the router.

pub mod logging;

pub use logging::{init_logging, LogFormat};

//! # OWASP LLM Playbook Service - Core Library Crate
//!
//! Generates, caches and exports security playbooks for the OWASP Top 10 for LLM
//! Applications (2025). The binary in `main.rs` wires these modules together; the
//! integration tests drive the same router in-process.
//!
//! ## Layout
//! - [`catalog`]: the fixed ten-category catalog and its reference context
//! - [`caching`]: fail-open playbook cache with a seven-day retention window
//! - [`generation`]: the text-generation client and prompts
//! - [`rendering`]: markdown to styled HTML export pages
//! - [`gateway`]: HTTP router, handlers and get-or-generate orchestration
//! - [`core`]: configuration and the application error type
//! - [`observability`]: logging setup

/// Configuration and error handling shared by every module
pub mod core;

/// HTTP surface and request orchestration
pub mod gateway;

/// Playbook cache: key derivation, stores, retention
pub mod caching;

/// The OWASP Top 10 for LLM Applications catalog
pub mod catalog;

/// Text-generation service client
pub mod generation;

/// Export page rendering
pub mod rendering;

/// Logging setup
pub mod observability;

pub use crate::core::config::AppConfig;
pub use crate::core::error::{PlaybookError, PlaybookResult};
pub use caching::{CacheManager, DiskCache, InMemoryCache};
pub use gateway::{build_router, AppState, PlaybookServer, PlaybookService};
pub use generation::{ContextProvider, OpenAiGenerator, PlaybookGenerator};

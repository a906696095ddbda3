//! # Gateway
//!
//! The HTTP surface of the service: router and server, request handlers, and the
//! get-or-generate orchestration they share.

pub mod handlers;
pub mod server;
pub mod service;

pub use server::{build_router, AppState, PlaybookServer};
pub use service::{PlaybookOutcome, PlaybookService};

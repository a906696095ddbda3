//! # Playbook Generation
//!
//! The text-generation side of the service: a [`PlaybookGenerator`] trait the request
//! path depends on, the OpenAI Responses API implementation, and the provider of the
//! static reference context that accompanies every playbook.

pub mod context;
pub mod openai;
pub mod prompts;

pub use context::ContextProvider;
pub use openai::{OpenAiGenerator, OpenAiGeneratorConfig};

use crate::catalog::OwaspContext;
use async_trait::async_trait;

/// Generation result type
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Failures of the text-generation service
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("request to generation service failed: {0}")]
    Network(String),

    #[error("generation service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode generation response: {0}")]
    InvalidResponse(String),

    #[error("generation service returned an empty playbook")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Produces a markdown playbook for one category
#[async_trait]
pub trait PlaybookGenerator: Send + Sync {
    /// Generate the playbook body for `category`, using `context` as a hint
    async fn generate(&self, category: &str, context: &OwaspContext) -> GenerationResult<String>;

    /// Short name for logs
    fn name(&self) -> &str;
}

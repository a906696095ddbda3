//! # OpenAI Playbook Generator
//!
//! Generates playbooks through the OpenAI Responses API (`POST {base_url}/responses`),
//! optionally with the hosted web search tool enabled so the model can consult the
//! current OWASP pages.

use super::prompts::{user_prompt, SYSTEM_PROMPT};
use super::{GenerationError, GenerationResult, PlaybookGenerator};
use crate::catalog::OwaspContext;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for [`OpenAiGenerator`]
#[derive(Debug, Clone)]
pub struct OpenAiGeneratorConfig {
    /// API base URL, without the `/responses` suffix
    pub base_url: String,

    /// Bearer token; generation fails at call time when absent
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Attach the hosted web search tool to each request
    pub web_search: bool,

    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for OpenAiGeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            web_search: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Playbook generator backed by the OpenAI Responses API
pub struct OpenAiGenerator {
    client: Client,
    config: OpenAiGeneratorConfig,
    endpoint: String,
}

impl OpenAiGenerator {
    /// Create a generator with its own HTTP client
    pub fn new(config: OpenAiGeneratorConfig) -> GenerationResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Create a generator that reuses an existing HTTP client
    pub fn with_client(client: Client, config: OpenAiGeneratorConfig) -> Self {
        let endpoint = format!("{}/responses", config.base_url.trim_end_matches('/'));
        Self {
            client,
            config,
            endpoint,
        }
    }

    /// Full URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request<'a>(&'a self, user_prompt: &'a str) -> ResponsesRequest<'a> {
        let tools = if self.config.web_search {
            vec![ResponsesTool {
                kind: "web_search_preview",
            }]
        } else {
            Vec::new()
        };

        ResponsesRequest {
            model: &self.config.model,
            tools,
            input: vec![
                InputMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                InputMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
        }
    }

    /// Pull a useful message out of a non-2xx response body
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> GenerationError {
        let message = serde_json::from_str::<ApiErrorResponse>(body)
            .map(|response| response.error.message)
            .unwrap_or_else(|_| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    body.trim().to_string()
                }
            });

        GenerationError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl PlaybookGenerator for OpenAiGenerator {
    async fn generate(&self, category: &str, context: &OwaspContext) -> GenerationResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let prompt = user_prompt(category, context);
        let request = self.build_request(&prompt);

        info!(model = %self.config.model, "Requesting playbook for {}", category);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = Self::parse_error_response(status, &body);
            error!("Error generating playbook for {}: {}", category, err);
            return Err(err);
        }

        let body: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let text = body.output_text();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!("Received {} bytes of playbook for {}", text.len(), category);
        Ok(text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ResponsesTool>,
    input: Vec<InputMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ResponsesTool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    output_text: Option<String>,
}

impl ResponsesResponse {
    /// Concatenated text of every `output_text` content part
    fn output_text(&self) -> String {
        let parts: Vec<&str> = self
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect();

        if parts.is_empty() {
            self.output_text.clone().unwrap_or_default()
        } else {
            parts.concat()
        }
    }
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

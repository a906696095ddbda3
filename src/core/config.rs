//! # Configuration Module
//!
//! This module holds the service configuration and its loading rules.
//!
//! ## Key Features
//! - YAML configuration parsing with serde
//! - Every field has a default, so a partial file (or no file at all) is valid
//! - Environment variable overrides applied after parsing
//! - Validation that reports every problem at once

use crate::core::error::{PlaybookError, PlaybookResult};
use crate::generation::openai::{
    OpenAiGeneratorConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};
use crate::observability::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "PLAYBOOK_CONFIG_PATH";

/// Config file used when `PLAYBOOK_CONFIG_PATH` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/playbook.yaml";

/// Main service configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Playbook cache settings
    pub cache: CacheConfig,

    /// Text-generation service settings
    pub generator: GeneratorConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the path in `PLAYBOOK_CONFIG_PATH`, or the default path
    ///
    /// A missing file is not an error: defaults are used and environment overrides
    /// still apply.
    pub async fn load() -> PlaybookResult<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_or_default(path).await
    }

    /// Load configuration from `path`, falling back to defaults when it does not exist
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> PlaybookResult<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Self::load_from_file(path).await
        } else {
            info!("No config file at {}, using defaults", path.display());
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> PlaybookResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| PlaybookError::config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text without overrides or validation
    pub fn from_yaml(content: &str) -> PlaybookResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Recognized variables: `PLAYBOOK_SERVER_PORT`, `PLAYBOOK_SERVER_BIND_ADDRESS`,
    /// `PLAYBOOK_CACHE_DIR`, `PLAYBOOK_CACHE_BACKEND`, `OPENAI_API_KEY`,
    /// `OPENAI_BASE_URL`, `PLAYBOOK_MODEL`, `PLAYBOOK_LOG_LEVEL`, `PLAYBOOK_LOG_FORMAT`.
    pub fn apply_env_overrides(&mut self) -> PlaybookResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, var: F) -> PlaybookResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = var("PLAYBOOK_SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| {
                    PlaybookError::config(format!("Invalid PLAYBOOK_SERVER_PORT: {}", e))
                })?;
        }

        if let Some(addr) = var("PLAYBOOK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Some(dir) = var("PLAYBOOK_CACHE_DIR") {
            self.cache.directory = PathBuf::from(dir);
        }

        if let Some(backend) = var("PLAYBOOK_CACHE_BACKEND") {
            self.cache.backend = match backend.to_ascii_lowercase().as_str() {
                "disk" => CacheBackend::Disk,
                "memory" => CacheBackend::Memory,
                other => {
                    return Err(PlaybookError::config(format!(
                        "Invalid PLAYBOOK_CACHE_BACKEND: {} (expected disk or memory)",
                        other
                    )))
                }
            };
        }

        if let Some(key) = var("OPENAI_API_KEY") {
            self.generator.api_key = Some(key);
        }

        if let Some(url) = var("OPENAI_BASE_URL") {
            self.generator.base_url = url;
        }

        if let Some(model) = var("PLAYBOOK_MODEL") {
            self.generator.model = model;
        }

        if let Some(level) = var("PLAYBOOK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = var("PLAYBOOK_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate the configuration, collecting every problem into one error
    pub fn validate(&self) -> PlaybookResult<()> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be greater than 0".to_string());
        }

        if self.server.bind_address.is_empty() {
            errors.push("server.bind_address cannot be empty".to_string());
        } else if self.server.socket_addr().is_err() {
            errors.push(format!(
                "server.bind_address is not a valid IP address: {}",
                self.server.bind_address
            ));
        }

        if self.server.request_timeout.is_zero() {
            errors.push("server.request_timeout must be greater than 0".to_string());
        }

        if self.cache.backend == CacheBackend::Disk && self.cache.directory.as_os_str().is_empty() {
            errors.push("cache.directory cannot be empty for the disk backend".to_string());
        }

        if let Err(e) = Url::parse(&self.generator.base_url) {
            errors.push(format!(
                "generator.base_url is not a valid URL ({}): {}",
                self.generator.base_url, e
            ));
        }

        if self.generator.model.is_empty() {
            errors.push("generator.model cannot be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.generator.temperature) {
            errors.push(format!(
                "generator.temperature must be between 0 and 2, got {}",
                self.generator.temperature
            ));
        }

        if self.generator.timeout.is_zero() {
            errors.push("generator.timeout must be greater than 0".to_string());
        } else if self.server.request_timeout <= self.generator.timeout {
            errors.push(format!(
                "server.request_timeout ({}) must be greater than generator.timeout ({})",
                humantime::format_duration(self.server.request_timeout),
                humantime::format_duration(self.generator.timeout)
            ));
        }

        if LogFormat::parse(&self.logging.format).is_err() {
            errors.push(format!(
                "logging.format must be json or pretty, got {}",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PlaybookError::config(errors.join("; ")))
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: String,

    /// Port to listen on
    pub port: u16,

    /// Frontend page served at `/`
    pub index_file: PathBuf,

    /// Upper bound on handling one request, generation included
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Parsed listener address
    pub fn socket_addr(&self) -> PlaybookResult<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| PlaybookError::config(format!("Invalid bind address: {}", e)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            index_file: PathBuf::from("index.html"),
            request_timeout: Duration::from_secs(180),
        }
    }
}

/// Cache storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// One JSON file per entry
    Disk,
    /// Process-local map
    Memory,
}

/// Playbook cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Which store to use
    pub backend: CacheBackend,

    /// Directory for the disk backend
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Disk,
            directory: PathBuf::from("cache"),
        }
    }
}

/// Text-generation service configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// API base URL
    pub base_url: String,

    /// API key; usually supplied through `OPENAI_API_KEY`
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Let the model use hosted web search
    pub web_search: bool,

    /// Timeout for one generation call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Probe each category's OWASP reference page before generating
    pub probe_references: bool,

    /// Allow only one in-flight generation per category
    pub single_flight: bool,
}

impl GeneratorConfig {
    /// Settings for the OpenAI generator
    pub fn openai(&self) -> OpenAiGeneratorConfig {
        OpenAiGeneratorConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            web_search: self.web_search,
            timeout: self.timeout,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            web_search: true,
            timeout: DEFAULT_TIMEOUT,
            probe_references: false,
            single_flight: true,
        }
    }
}

// Hand-written so the API key never reaches the logs.
impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("web_search", &self.web_search)
            .field("timeout", &self.timeout)
            .field("probe_references", &self.probe_references)
            .field("single_flight", &self.single_flight)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Output format: `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "owasp_playbook=info,tower_http=info".to_string(),
            format: "json".to_string(),
        }
    }
}

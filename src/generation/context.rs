//! # Reference Context Provider
//!
//! Supplies the static OWASP reference metadata that is attached to each playbook.
//! Optionally probes the reference page over HTTP; the probe only produces a log line
//! and never changes the returned context.

use crate::catalog::{self, OwaspContext};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

/// Timeout for the optional reference page probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves the reference context for a category
#[derive(Debug, Clone)]
pub struct ContextProvider {
    /// Client used for the reference probe, when enabled
    probe_client: Option<Client>,
}

impl ContextProvider {
    /// Provider that only returns static context
    pub fn new() -> Self {
        Self { probe_client: None }
    }

    /// Provider that also probes each reference page
    pub fn with_probe(client: Client) -> Self {
        Self {
            probe_client: Some(client),
        }
    }

    /// Static context for `category`; the fallback context for unknown labels
    pub async fn fetch(&self, category: &str) -> OwaspContext {
        let Some(info) = catalog::find(category) else {
            return OwaspContext::fallback();
        };

        if let Some(client) = &self.probe_client {
            self.probe(client, category, info.url).await;
        }

        OwaspContext::from(info)
    }

    async fn probe(&self, client: &Client, category: &str, url: &str) {
        match client.get(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Successfully fetched additional OWASP data for {}", category);
            }
            Ok(response) => {
                warn!(
                    "Could not fetch live OWASP data for {}: status {}",
                    category,
                    response.status()
                );
            }
            Err(e) => warn!("Could not fetch live OWASP data for {}: {}", category, e),
        }
    }
}

impl Default for ContextProvider {
    fn default() -> Self {
        Self::new()
    }
}

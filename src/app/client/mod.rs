//! Provider access for CelesTrak
//!
//! The orchestrator only needs one capability from the network: "give me the
//! bytes behind this URL". That capability is the [`Fetcher`] trait, so the
//! core never depends on a particular transport and tests can script
//! responses. [`CelestrakClient`] is the production implementation on top of
//! reqwest. It makes exactly one attempt per call.
//!
//! - `config`: HTTP client configuration and building
//! - `endpoint`: mapping from group id to request URL

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::errors::{FetchError, FetchResult, Result};

pub mod config;
pub mod endpoint;

pub use config::ClientConfig;
pub use endpoint::ProviderEndpoint;

/// Fetch raw payload bytes for a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a single GET; non-success responses are errors
    async fn fetch(&self, url: &Url) -> FetchResult<Vec<u8>>;
}

/// HTTP client for the CelesTrak GP endpoint
#[derive(Debug, Clone)]
pub struct CelestrakClient {
    client: Client,
}

impl CelestrakClient {
    /// Creates a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = config.build_http_client()?;
        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for CelestrakClient {
    async fn fetch(&self, url: &Url) -> FetchResult<Vec<u8>> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

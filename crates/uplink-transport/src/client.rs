//! HTTP client for upload hosts
//!
//! [`UploadClient`] wraps a `reqwest::Client` configured once from the
//! `upload` section: per-request timeout, `User-Agent`, and whether invalid
//! TLS certificates are accepted. It knows nothing about hosts; callers pass
//! the full URL for each request.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, warn};
use uplink_core::config::UploadConfig;

use crate::encoder::CompressedContent;
use crate::TransportError;

/// Thin wrapper over `reqwest::Client` for compressed POSTs
#[derive(Debug, Clone)]
pub struct UploadClient {
    client: Client,
    timeout: Duration,
}

impl UploadClient {
    /// Builds a client from the `upload` configuration section
    ///
    /// # Errors
    /// Returns [`TransportError::ClientBuild`] if the TLS backend cannot be
    /// initialised or the user agent is not a valid header value.
    pub fn new(config: &UploadConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for uploads");
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POSTs `content` to `url`
    ///
    /// A fresh compressed body stream is created for this request. Any HTTP
    /// status is returned as `Ok`; only transport-level failures (connect,
    /// TLS, timeout) are `Err`.
    pub async fn post(
        &self,
        url: &str,
        content: &CompressedContent,
    ) -> Result<Response, reqwest::Error> {
        debug!(url, uncompressed_bytes = content.original_len(), "POST");
        self.client
            .post(url)
            .headers(content.headers().clone())
            .body(content.body())
            .send()
            .await
    }
}

//! Fetching description documents and search feeds.
//!
//! The client reaches the network only through [`Transport`], so tests
//! can substitute canned responses. [`HttpTransport`] is the default,
//! backed by a shared [`reqwest::Client`].

use std::future::Future;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{OpenSearchError, Result};

/// Fetches the raw bytes behind a URL.
///
/// Failures are reported once as [`OpenSearchError::Transport`];
/// implementations do not retry.
pub trait Transport: Send + Sync {
    /// GET `url`, sending `user_agent`, and return the response body.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::Transport`] on any failure. The message
    /// must not include `url`, which carries the search terms.
    fn fetch(&self, url: &str, user_agent: &str)
        -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// [`Transport`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from `config`.
    ///
    /// The underlying client has:
    /// - Timeout from config
    /// - Redirect limit from config
    /// - Brotli and gzip decompression
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::Transport`] if the client cannot be
    /// constructed.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| OpenSearchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Vec<u8>> {
        tracing::trace!(url, "fetching");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| {
                OpenSearchError::Transport(format!("request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "fetch returned non-success status");
            return Err(OpenSearchError::Transport(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| {
                OpenSearchError::Transport(format!("failed to read body: {}", e.without_url()))
            })?;

        tracing::debug!(bytes = body.len(), "fetch complete");
        Ok(body.to_vec())
    }
}

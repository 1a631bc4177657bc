//! Client configuration with sensible defaults.
//!
//! [`ClientConfig`] controls the User-Agent and HTTP behaviour used when
//! fetching description documents and search feeds.

use crate::error::OpenSearchError;

/// User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("opensearch-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for an [`OpenSearchClient`](crate::client::OpenSearchClient).
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User-Agent sent with every fetch.
    pub user_agent: String,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum number of redirects followed per fetch.
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_seconds: 10,
            max_redirects: 10,
        }
    }
}

impl ClientConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `user_agent` must not be blank
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), OpenSearchError> {
        if self.user_agent.trim().is_empty() {
            return Err(OpenSearchError::Config(
                "user_agent must not be empty".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(OpenSearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

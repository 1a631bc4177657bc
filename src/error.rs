//! Error types for the opensearch-client crate.
//!
//! All errors carry a plain string payload so they can be displayed to
//! users and matched programmatically. Search terms never appear in
//! error messages.

/// Errors that can occur while building OpenSearch requests or parsing
/// OpenSearch documents.
#[derive(Debug, thiserror::Error)]
pub enum OpenSearchError {
    /// The URL template is not a valid absolute URL.
    #[error("invalid URL template: {0}")]
    InvalidTemplate(String),

    /// A parameter OpenSearch requires (`searchTerms`) was not supplied.
    #[error("missing required parameter: {0}")]
    MissingRequiredParameter(String),

    /// A description document or response feed is not well-formed XML.
    #[error("malformed XML document: {0}")]
    MalformedFeed(String),

    /// A value of the wrong type was passed to a parameter setter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Fetching a URL failed. Never retried.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for opensearch-client results.
pub type Result<T> = std::result::Result<T, OpenSearchError>;

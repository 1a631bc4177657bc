//! # opensearch-client
//!
//! A client for the OpenSearch 1.1 protocol.
//!
//! Given a provider's description document, this crate extracts the Atom
//! URL template, builds compliant search request URLs from caller-supplied
//! parameters, and parses the provider's Atom + OpenSearch response feed
//! into entries and paging figures.
//!
//! ## Design
//!
//! - [`UrlTemplate`] decomposes a templated URL into a base URL plus
//!   recognized, optional and foreign query fields
//! - [`build_request_url`] merges a template with [`SearchParameters`] in a
//!   fixed parameter order
//! - [`SearchResponse`] parses the feed and derives `endIndex` and
//!   `numPages`
//! - [`OpenSearchClient`] performs one fetch per call through a pluggable
//!   [`Transport`]; nothing is cached or retried
//!
//! ## Security
//!
//! - Search terms are logged only at trace level
//! - Search terms never appear in error messages

pub mod client;
pub mod config;
pub mod description;
pub mod error;
pub mod http;
pub mod query;
pub mod request;
pub mod response;
pub mod template;
pub mod types;
mod xml;

pub use client::OpenSearchClient;
pub use config::ClientConfig;
pub use description::{DescriptionDocument, TemplateUrl};
pub use error::{OpenSearchError, Result};
pub use http::{HttpTransport, Transport};
pub use query::SearchParameters;
pub use request::build_request_url;
pub use response::{Entry, SearchResponse};
pub use template::{ForeignField, UrlTemplate};
pub use types::Parameter;

/// Extract the Atom URL template from a description document.
///
/// Returns `None` when the document advertises no
/// `application/atom+xml` URL.
///
/// # Errors
///
/// Returns [`OpenSearchError::MalformedFeed`] if `xml` is not well-formed.
///
/// # Examples
///
/// ```
/// let xml = br#"<OpenSearchDescription xmlns="http://a9.com/-/spec/opensearch/1.1/">
///   <Url type="application/atom+xml" template="http://example.com/?q={searchTerms}&amp;format=atom"/>
/// </OpenSearchDescription>"#;
/// let template = opensearch_client::configure(xml).unwrap();
/// assert_eq!(template.as_deref(), Some("http://example.com/?q={searchTerms}&format=atom"));
/// ```
pub fn configure(xml: &[u8]) -> Result<Option<String>> {
    let document = DescriptionDocument::load(xml)?;
    Ok(document.template().map(str::to_owned))
}

/// Parse `template` and build the request URL for `params`.
///
/// # Errors
///
/// Returns [`OpenSearchError::InvalidTemplate`] if `template` is not a
/// valid URL, or [`OpenSearchError::MissingRequiredParameter`] if no
/// search terms are set.
///
/// # Examples
///
/// ```
/// let mut params = opensearch_client::SearchParameters::new();
/// params.set_search_terms(["rust", "xml"]).set_count(20);
/// let url = opensearch_client::build_search_url(
///     "http://example.com/search?q={searchTerms}&n={count?}",
///     &params,
/// )
/// .unwrap();
/// assert_eq!(url, "http://example.com/search?q=rust+xml&n=20");
/// ```
pub fn build_search_url(template: &str, params: &SearchParameters) -> Result<String> {
    let template = UrlTemplate::parse(template)?;
    build_request_url(&template, params)
}

/// Parse an Atom + OpenSearch response feed.
///
/// # Errors
///
/// Returns [`OpenSearchError::MalformedFeed`] if the feed is not
/// well-formed or carries an invalid timestamp.
pub fn parse_response(xml: &[u8]) -> Result<SearchResponse> {
    SearchResponse::load(xml)
}

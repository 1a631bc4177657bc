//! A reusable OpenSearch client.
//!
//! [`OpenSearchClient`] ties the pieces together: it fetches a
//! description document to discover the Atom template, then for each
//! search builds the request URL from its [`SearchParameters`], fetches
//! the feed and parses it. Each call performs exactly one fetch.

use crate::config::ClientConfig;
use crate::description::DescriptionDocument;
use crate::error::Result;
use crate::http::{HttpTransport, Transport};
use crate::query::SearchParameters;
use crate::request::build_request_url;
use crate::response::SearchResponse;
use crate::template::UrlTemplate;

/// OpenSearch client over a [`Transport`].
///
/// Parameters persist between searches, so paging through results is a
/// matter of bumping `startPage` or `startIndex` and searching again.
#[derive(Debug)]
pub struct OpenSearchClient<T: Transport = HttpTransport> {
    transport: T,
    user_agent: String,
    parameters: SearchParameters,
}

impl OpenSearchClient<HttpTransport> {
    /// Create a client that fetches over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::Config`](crate::OpenSearchError::Config)
    /// if `config` is invalid, or
    /// [`OpenSearchError::Transport`](crate::OpenSearchError::Transport) if
    /// the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> OpenSearchClient<T> {
    /// Create a client over a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            user_agent: config.user_agent,
            parameters: SearchParameters::new(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Override the User-Agent for subsequent fetches.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Parameters used by the next [`search`](Self::search).
    pub fn parameters(&self) -> &SearchParameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut SearchParameters {
        &mut self.parameters
    }

    /// Fetch the description document at `description_url` and return its
    /// Atom template, or `None` if it does not advertise one.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::Transport`](crate::OpenSearchError::Transport)
    /// if the fetch fails, or
    /// [`OpenSearchError::MalformedFeed`](crate::OpenSearchError::MalformedFeed)
    /// if the document is not well-formed.
    pub async fn configure(&self, description_url: &str) -> Result<Option<String>> {
        let raw = self
            .transport
            .fetch(description_url, &self.user_agent)
            .await?;
        let document = DescriptionDocument::load(&raw)?;
        if document.template().is_none() {
            tracing::warn!(description_url, "description document has no Atom template");
        }
        Ok(document.template().map(str::to_owned))
    }

    /// Search `template` with the current parameters.
    ///
    /// # Errors
    ///
    /// - [`InvalidTemplate`](crate::OpenSearchError::InvalidTemplate) if the
    ///   template is not a URL or has no `{searchTerms}` slot.
    /// - [`MissingRequiredParameter`](crate::OpenSearchError::MissingRequiredParameter)
    ///   if no search terms are set.
    /// - [`Transport`](crate::OpenSearchError::Transport) if the fetch fails.
    /// - [`MalformedFeed`](crate::OpenSearchError::MalformedFeed) if the
    ///   response is not a well-formed feed.
    pub async fn search(&self, template: &str) -> Result<SearchResponse> {
        let template = UrlTemplate::parse(template)?;
        template.ensure_search_terms()?;
        let url = build_request_url(&template, &self.parameters)?;

        let raw = self.transport.fetch(&url, &self.user_agent).await?;
        let response = SearchResponse::load(&raw)?;

        tracing::debug!(
            entries = response.entries().len(),
            total_results = response.total_results(),
            "search complete"
        );
        Ok(response)
    }
}

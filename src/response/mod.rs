//! OpenSearch Atom response parsing.
//!
//! [`SearchResponse::load`] decodes an Atom feed carrying the OpenSearch
//! 1.1 extension elements (`totalResults`, `startIndex`, `itemsPerPage`,
//! `Query`) into [`Entry`] records plus paging figures.

pub mod entry;

pub use entry::Entry;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::SearchParameters;
use crate::types::{Parameter, OPENSEARCH_NAMESPACE};
use crate::xml::{XmlDocument, XmlElement};

/// A parsed search response. Immutable after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    entries: Vec<Entry>,
    total_results: u64,
    start_index: u64,
    items_per_page: u64,
    num_pages: Option<u64>,
    request_query: Option<SearchParameters>,
}

impl SearchResponse {
    /// Parse a raw Atom + OpenSearch feed.
    ///
    /// Every `<entry>` directly under the feed root becomes an [`Entry`].
    /// Missing OpenSearch counters read as zero, and absent or
    /// unrecognised entry fields are left unset.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::MalformedFeed`](crate::OpenSearchError::MalformedFeed)
    /// if the feed is not well-formed XML. No partial result is returned.
    pub fn load(raw: &[u8]) -> Result<Self> {
        let document = XmlDocument::parse(raw)?;
        let feed = &document.root;
        let atom = feed.namespace.as_deref();
        let media = document.namespace_for(entry::MEDIA_PREFIX);

        let entries: Vec<Entry> = feed
            .children_named(atom, "entry")
            .map(|element| Entry::from_element(element, atom, media))
            .collect();

        let counter = |name: &str| {
            feed.child(Some(OPENSEARCH_NAMESPACE), name)
                .map(|element| leading_integer(&element.text))
                .unwrap_or(0)
        };
        let total_results = counter("totalResults");
        let start_index = counter("startIndex");
        let items_per_page = counter("itemsPerPage");

        let num_pages = (total_results > 0 && items_per_page > 0)
            .then(|| total_results.div_ceil(items_per_page));

        let request_query = feed
            .children_named(Some(OPENSEARCH_NAMESPACE), "Query")
            .find(|query| query.attribute("role") == Some("request"))
            .map(query_to_parameters);

        tracing::debug!(
            entries = entries.len(),
            total_results,
            start_index,
            items_per_page,
            "search response parsed"
        );

        Ok(Self {
            entries,
            total_results,
            start_index,
            items_per_page,
            num_pages,
            request_query,
        })
    }

    /// Parsed entries in feed order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Consumes the response, returning its entries.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn has_results(&self) -> bool {
        !self.entries.is_empty()
    }

    /// `opensearch:totalResults`.
    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    /// `opensearch:startIndex`.
    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// `opensearch:itemsPerPage`.
    pub fn items_per_page(&self) -> u64 {
        self.items_per_page
    }

    /// `ceil(totalResults / itemsPerPage)`, or `None` when either is zero.
    pub fn num_pages(&self) -> Option<u64> {
        self.num_pages
    }

    /// Index one past the last result on this page:
    /// `min(startIndex + itemsPerPage, totalResults)`. Always recomputed.
    pub fn end_index(&self) -> u64 {
        self.start_index
            .saturating_add(self.items_per_page)
            .min(self.total_results)
    }

    /// The `<opensearch:Query role="request">` element echoed by the
    /// provider, as search parameters.
    pub fn request_query(&self) -> Option<&SearchParameters> {
        self.request_query.as_ref()
    }
}

/// Integer prefix of `text`, the way a lenient cast reads it: leading
/// whitespace and `+` are skipped, anything non-numeric or negative is 0.
fn leading_integer(text: &str) -> u64 {
    let trimmed = text.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..end].parse().unwrap_or(0)
}

fn query_to_parameters(query: &XmlElement) -> SearchParameters {
    let mut params = SearchParameters::new();
    for &parameter in Parameter::all() {
        let Some(value) = query.attribute(parameter.name()) else {
            continue;
        };
        let integer = || value.trim().parse::<u64>().ok();
        match parameter {
            Parameter::SearchTerms => {
                params.set_search_terms(value.split(|c: char| c == '+' || c.is_whitespace()));
            }
            Parameter::Count => {
                if let Some(n) = integer() {
                    params.set_count(n);
                }
            }
            Parameter::StartIndex => {
                if let Some(n) = integer() {
                    params.set_start_index(n);
                }
            }
            Parameter::StartPage => {
                if let Some(n) = integer() {
                    params.set_start_page(n);
                }
            }
            Parameter::Language => {
                params.set_language(value);
            }
            Parameter::InputEncoding => {
                params.set_input_encoding(value);
            }
            Parameter::OutputEncoding => {
                params.set_output_encoding(value);
            }
        }
    }
    params
}

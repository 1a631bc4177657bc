//! Core types shared by template parsing, request building and response
//! parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OpenSearchError;

/// XML namespace of the OpenSearch 1.1 response elements.
pub const OPENSEARCH_NAMESPACE: &str = "http://a9.com/-/spec/opensearch/1.1/";

/// MIME type of the Atom response format, used to pick the URL template
/// out of a description document.
pub const ATOM_MIME_TYPE: &str = "application/atom+xml";

/// The seven template parameters defined by OpenSearch 1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    /// Keywords for the search, `+`-joined.
    SearchTerms,
    /// Number of results per page.
    Count,
    /// Index of the first result.
    StartIndex,
    /// Page number of the first result.
    StartPage,
    /// Desired language of the results.
    Language,
    /// Character encoding of the request.
    InputEncoding,
    /// Desired character encoding of the response.
    OutputEncoding,
}

impl Parameter {
    /// Returns the name used for this parameter inside URL templates.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchTerms => "searchTerms",
            Self::Count => "count",
            Self::StartIndex => "startIndex",
            Self::StartPage => "startPage",
            Self::Language => "language",
            Self::InputEncoding => "inputEncoding",
            Self::OutputEncoding => "outputEncoding",
        }
    }

    /// Looks up a parameter by its template name. Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.name() == name)
    }

    /// Whether values for this parameter must be integers.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Count | Self::StartIndex | Self::StartPage)
    }

    /// Returns all parameters in declaration order.
    pub fn all() -> &'static [Parameter] {
        &[
            Self::SearchTerms,
            Self::Count,
            Self::StartIndex,
            Self::StartPage,
            Self::Language,
            Self::InputEncoding,
            Self::OutputEncoding,
        ]
    }

    /// Order in which parameters are written into a request query string.
    pub fn request_order() -> &'static [Parameter] {
        &[
            Self::SearchTerms,
            Self::StartPage,
            Self::Count,
            Self::StartIndex,
            Self::Language,
            Self::InputEncoding,
            Self::OutputEncoding,
        ]
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = OpenSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            OpenSearchError::InvalidArgument(format!("unknown OpenSearch parameter: {s}"))
        })
    }
}

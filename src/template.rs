//! URL template parsing.
//!
//! A description document advertises a templated URL such as
//! `http://example.com/search?q={searchTerms}&pw={startPage?}&format=atom`.
//! [`UrlTemplate::parse`] splits it into a base URL, the query key used for
//! each recognized OpenSearch parameter, the parameters marked optional with
//! a trailing `?`, and the literal `key=value` pairs that must be replayed
//! verbatim on every request.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use crate::error::{OpenSearchError, Result};
use crate::types::Parameter;

/// A literal query pair from the template that is not an OpenSearch
/// parameter, e.g. `format=rss`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignField {
    /// Decoded query key.
    pub key: String,
    /// The raw `key=value` segment exactly as written in the template.
    pub literal: String,
}

/// A parsed OpenSearch URL template. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlTemplate {
    template: String,
    base_url: String,
    fields: BTreeMap<Parameter, String>,
    optional_fields: BTreeSet<Parameter>,
    foreign_fields: Vec<ForeignField>,
}

impl UrlTemplate {
    /// Parse a templated URL.
    ///
    /// HTML entities are decoded first, since templates are usually lifted
    /// from XML attributes where `&` is written as `&amp;`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::InvalidTemplate`] if the template is not
    /// an absolute URL with a host.
    pub fn parse(template: &str) -> Result<Self> {
        let decoded = html_escape::decode_html_entities(template.trim()).into_owned();

        let url = Url::parse(&decoded)
            .map_err(|e| OpenSearchError::InvalidTemplate(format!("{e}: {decoded}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| OpenSearchError::InvalidTemplate(format!("URL has no host: {decoded}")))?;

        // Url::port() is None for the scheme's default port.
        let base_url = match url.port() {
            Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
            None => format!("{}://{}{}", url.scheme(), host, url.path()),
        };

        let mut parsed = Self {
            base_url,
            fields: BTreeMap::new(),
            optional_fields: BTreeSet::new(),
            foreign_fields: Vec::new(),
            template: String::new(),
        };

        let raw_query = decoded
            .split('#')
            .next()
            .and_then(|without_fragment| without_fragment.split_once('?'))
            .map(|(_, query)| query)
            .unwrap_or("");

        for segment in raw_query.split('&').filter(|s| !s.is_empty()) {
            parsed.classify_segment(segment);
        }

        tracing::debug!(
            base_url = %parsed.base_url,
            fields = parsed.fields.len(),
            optional = parsed.optional_fields.len(),
            foreign = parsed.foreign_fields.len(),
            "URL template parsed"
        );

        parsed.template = decoded;
        Ok(parsed)
    }

    fn classify_segment(&mut self, segment: &str) {
        let Some((key, value)) = form_urlencoded::parse(segment.as_bytes()).next() else {
            return;
        };
        self.forget_key(&key);

        let stripped = value.trim_matches(|c: char| c == '{' || c == '}');
        let (name, optional) = match stripped.strip_suffix('?') {
            Some(name) => (name, true),
            None => (stripped, false),
        };

        if let Some(parameter) = Parameter::from_name(name) {
            tracing::trace!(%parameter, key = %key, optional, "template parameter");
            self.fields.insert(parameter, key.into_owned());
            if optional {
                self.optional_fields.insert(parameter);
            } else {
                self.optional_fields.remove(&parameter);
            }
        } else if !value.contains(['{', '}']) {
            tracing::trace!(literal = segment, "foreign template field");
            self.foreign_fields.push(ForeignField {
                key: key.into_owned(),
                literal: segment.to_owned(),
            });
        } else {
            tracing::trace!(key = %key, placeholder = %value, "ignoring unrecognised placeholder");
        }
    }

    /// Drop whatever an earlier segment recorded under `key`, so the last
    /// occurrence of a query key wins.
    fn forget_key(&mut self, key: &str) {
        let stale: Vec<Parameter> = self
            .fields
            .iter()
            .filter(|(_, existing)| existing.as_str() == key)
            .map(|(parameter, _)| *parameter)
            .collect();
        for parameter in stale {
            self.fields.remove(&parameter);
            self.optional_fields.remove(&parameter);
        }
        self.foreign_fields.retain(|field| field.key != key);
    }

    /// The template after HTML entity decoding.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Scheme, host, optional port and path, without query string.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The query key the provider uses for `parameter`, if the template
    /// has a slot for it.
    pub fn field_key(&self, parameter: Parameter) -> Option<&str> {
        self.fields.get(&parameter).map(String::as_str)
    }

    /// Render `parameter` as a `key=value` query fragment, if the template
    /// has a slot for it.
    pub fn render_field(&self, parameter: Parameter, value: &str) -> Option<String> {
        self.field_key(parameter).map(|key| format!("{key}={value}"))
    }

    /// All recognized parameters and their query keys.
    pub fn fields(&self) -> impl Iterator<Item = (Parameter, &str)> {
        self.fields.iter().map(|(p, key)| (*p, key.as_str()))
    }

    /// Whether `parameter` is marked optional (`{name?}`).
    pub fn is_optional(&self, parameter: Parameter) -> bool {
        self.optional_fields.contains(&parameter)
    }

    /// Parameters marked optional.
    pub fn optional_fields(&self) -> impl Iterator<Item = Parameter> + '_ {
        self.optional_fields.iter().copied()
    }

    /// Literal pairs passed through on every request, in template order.
    pub fn foreign_fields(&self) -> &[ForeignField] {
        &self.foreign_fields
    }

    /// Whether the template has the `searchTerms` slot OpenSearch requires.
    pub fn has_search_terms(&self) -> bool {
        self.fields.contains_key(&Parameter::SearchTerms)
    }

    /// Fails with [`OpenSearchError::InvalidTemplate`] when the template
    /// has no `searchTerms` slot.
    pub fn ensure_search_terms(&self) -> Result<()> {
        if self.has_search_terms() {
            Ok(())
        } else {
            Err(OpenSearchError::InvalidTemplate(format!(
                "template has no {{searchTerms}} parameter: {}",
                self.template
            )))
        }
    }
}

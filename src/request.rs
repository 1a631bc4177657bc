//! Request URL construction.
//!
//! Merges a parsed [`UrlTemplate`] with caller-supplied
//! [`SearchParameters`]. Parameters are written in the fixed order of
//! [`Parameter::request_order`]; a parameter is included only when the
//! template has a slot for it and the caller set a value. Foreign template
//! fields are always appended, after the OpenSearch parameters.

use crate::error::{OpenSearchError, Result};
use crate::query::SearchParameters;
use crate::template::UrlTemplate;
use crate::types::Parameter;

/// Build the request URL for `params` against `template`.
///
/// If no fragment resolves (the template has no OpenSearch slots and no
/// foreign fields) the base URL is returned without a query string.
///
/// # Errors
///
/// Returns [`OpenSearchError::MissingRequiredParameter`] if
/// `params` has no search terms.
///
/// # Examples
///
/// ```
/// use opensearch_client::{build_request_url, SearchParameters, UrlTemplate};
///
/// let template = UrlTemplate::parse("http://example.com/?q={searchTerms}").unwrap();
/// let mut params = SearchParameters::new();
/// params.set_search_terms(["term1", "term2"]);
/// let url = build_request_url(&template, &params).unwrap();
/// assert_eq!(url, "http://example.com/?q=term1+term2");
/// ```
pub fn build_request_url(template: &UrlTemplate, params: &SearchParameters) -> Result<String> {
    if params.search_terms().is_none() {
        return Err(OpenSearchError::MissingRequiredParameter(
            "searchTerms must be set before building a request".into(),
        ));
    }

    if !template.has_search_terms() {
        tracing::warn!(
            template = template.template(),
            "URL template has no searchTerms slot"
        );
    }

    let mut fragments: Vec<String> = Parameter::request_order()
        .iter()
        .filter_map(|&parameter| {
            let value = params.get(parameter)?;
            template.render_field(parameter, &value)
        })
        .collect();

    fragments.extend(
        template
            .foreign_fields()
            .iter()
            .map(|field| field.literal.clone()),
    );

    let url = if fragments.is_empty() {
        template.base_url().to_owned()
    } else {
        format!("{}?{}", template.base_url(), fragments.join("&"))
    };

    tracing::debug!(fragments = fragments.len(), "request URL built");
    tracing::trace!(%url, "request URL");
    Ok(url)
}

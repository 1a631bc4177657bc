//! Caller-supplied search parameters.
//!
//! [`SearchParameters`] is a mutable builder populated before a search.
//! Typed setters cover the common case; [`SearchParameters::set`] accepts
//! untyped JSON input and rejects values of the wrong type instead of
//! coercing them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OpenSearchError, Result};
use crate::types::Parameter;

/// Values for the OpenSearch template parameters. Unset fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameters {
    search_terms: Option<String>,
    count: Option<u64>,
    start_index: Option<u64>,
    start_page: Option<u64>,
    language: Option<String>,
    input_encoding: Option<String>,
    output_encoding: Option<String>,
}

impl SearchParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search terms.
    ///
    /// Empty terms are dropped, the rest are trimmed and joined with `+`.
    /// If nothing remains, `searchTerms` is left unset.
    pub fn set_search_terms<I, S>(&mut self, terms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_owned())
            .filter(|term| !term.is_empty())
            .collect::<Vec<_>>()
            .join("+");
        self.search_terms = (!joined.is_empty()).then_some(joined);
        self
    }

    /// The `+`-joined search terms.
    pub fn search_terms(&self) -> Option<&str> {
        self.search_terms.as_deref()
    }

    pub fn set_count(&mut self, count: u64) -> &mut Self {
        self.count = Some(count);
        self
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    pub fn set_start_index(&mut self, start_index: u64) -> &mut Self {
        self.start_index = Some(start_index);
        self
    }

    pub fn start_index(&self) -> Option<u64> {
        self.start_index
    }

    pub fn set_start_page(&mut self, start_page: u64) -> &mut Self {
        self.start_page = Some(start_page);
        self
    }

    pub fn start_page(&self) -> Option<u64> {
        self.start_page
    }

    /// The start page, or 1 when the caller has not chosen one.
    pub fn start_page_or_default(&self) -> u64 {
        self.start_page.unwrap_or(1)
    }

    pub fn set_language(&mut self, language: impl Into<String>) -> &mut Self {
        self.language = Some(language.into());
        self
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_input_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.input_encoding = Some(encoding.into());
        self
    }

    pub fn input_encoding(&self) -> Option<&str> {
        self.input_encoding.as_deref()
    }

    pub fn set_output_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.output_encoding = Some(encoding.into());
        self
    }

    pub fn output_encoding(&self) -> Option<&str> {
        self.output_encoding.as_deref()
    }

    /// Set `parameter` from an untyped value.
    ///
    /// - `count`, `startIndex` and `startPage` accept only non-negative
    ///   JSON integers.
    /// - `language`, `inputEncoding` and `outputEncoding` accept only
    ///   JSON strings.
    /// - `searchTerms` accepts a string or an array of strings, which go
    ///   through [`set_search_terms`](Self::set_search_terms).
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::InvalidArgument`] when `value` has the
    /// wrong type. The stored value is left unchanged.
    pub fn set(&mut self, parameter: Parameter, value: Value) -> Result<&mut Self> {
        if parameter.is_integer() {
            let number = integer_from_value(parameter, &value)?;
            return Ok(match parameter {
                Parameter::StartIndex => self.set_start_index(number),
                Parameter::StartPage => self.set_start_page(number),
                _ => self.set_count(number),
            });
        }
        match parameter {
            Parameter::SearchTerms => {
                let terms = search_terms_from_value(&value)?;
                Ok(self.set_search_terms(terms))
            }
            Parameter::Language => Ok(self.set_language(string_from_value(parameter, value)?)),
            Parameter::InputEncoding => {
                Ok(self.set_input_encoding(string_from_value(parameter, value)?))
            }
            _ => Ok(self.set_output_encoding(string_from_value(parameter, value)?)),
        }
    }

    /// The value of `parameter` rendered for a query string, if set.
    pub fn get(&self, parameter: Parameter) -> Option<String> {
        match parameter {
            Parameter::SearchTerms => self.search_terms.clone(),
            Parameter::Count => self.count.map(|n| n.to_string()),
            Parameter::StartIndex => self.start_index.map(|n| n.to_string()),
            Parameter::StartPage => self.start_page.map(|n| n.to_string()),
            Parameter::Language => self.language.clone(),
            Parameter::InputEncoding => self.input_encoding.clone(),
            Parameter::OutputEncoding => self.output_encoding.clone(),
        }
    }

    /// Whether `parameter` has a value.
    pub fn is_set(&self, parameter: Parameter) -> bool {
        match parameter {
            Parameter::SearchTerms => self.search_terms.is_some(),
            Parameter::Count => self.count.is_some(),
            Parameter::StartIndex => self.start_index.is_some(),
            Parameter::StartPage => self.start_page.is_some(),
            Parameter::Language => self.language.is_some(),
            Parameter::InputEncoding => self.input_encoding.is_some(),
            Parameter::OutputEncoding => self.output_encoding.is_some(),
        }
    }
}

fn integer_from_value(parameter: Parameter, value: &Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        OpenSearchError::InvalidArgument(format!(
            "{parameter} must be a non-negative integer, got {}",
            json_type_name(value)
        ))
    })
}

fn string_from_value(parameter: Parameter, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(OpenSearchError::InvalidArgument(format!(
            "{parameter} must be a string, got {}",
            json_type_name(&other)
        ))),
    }
}

fn search_terms_from_value(value: &Value) -> Result<Vec<&str>> {
    let invalid = || {
        OpenSearchError::InvalidArgument(format!(
            "searchTerms must be a string or an array of strings, got {}",
            json_type_name(value)
        ))
    };
    match value {
        Value::String(s) => Ok(vec![s.as_str()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_u64() => "integer",
        Value::Number(n) if n.is_i64() => "negative integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_terms_are_trimmed_and_plus_joined() {
        let mut params = SearchParameters::new();
        params.set_search_terms(["test", "search"]);
        assert_eq!(params.search_terms(), Some("test+search"));
    }

    #[test]
    fn empty_search_terms_are_dropped() {
        let mut params = SearchParameters::new();
        params.set_search_terms(["", "  rust ", "", "lang"]);
        assert_eq!(params.search_terms(), Some("rust+lang"));
    }

    #[test]
    fn all_blank_search_terms_leave_field_unset() {
        let mut params = SearchParameters::new();
        params.set_search_terms(["", "   "]);
        assert_eq!(params.search_terms(), None);
        assert!(!params.is_set(Parameter::SearchTerms));
    }

    #[test]
    fn count_round_trips() {
        let mut params = SearchParameters::new();
        params.set_count(5);
        assert_eq!(params.count(), Some(5));
    }

    #[test]
    fn getters_return_none_when_unset() {
        let params = SearchParameters::new();
        for parameter in Parameter::all() {
            assert_eq!(params.get(*parameter), None, "{parameter}");
        }
        assert_eq!(params.start_page_or_default(), 1);
    }

    #[test]
    fn string_setters_round_trip() {
        let mut params = SearchParameters::new();
        params
            .set_language("en")
            .set_input_encoding("UTF-8")
            .set_output_encoding("UTF-8");
        assert_eq!(params.language(), Some("en"));
        assert_eq!(params.input_encoding(), Some("UTF-8"));
        assert_eq!(params.output_encoding(), Some("UTF-8"));
    }

    #[test]
    fn set_accepts_integers_for_paging_parameters() {
        let mut params = SearchParameters::new();
        params.set(Parameter::Count, json!(5)).expect("count");
        params.set(Parameter::StartIndex, json!(1)).expect("startIndex");
        params.set(Parameter::StartPage, json!(2)).expect("startPage");
        assert_eq!(params.count(), Some(5));
        assert_eq!(params.start_index(), Some(1));
        assert_eq!(params.start_page(), Some(2));
        assert_eq!(params.start_page_or_default(), 2);
    }

    #[test]
    fn set_rejects_every_non_integer_for_count() {
        let wrong = [
            json!("count"),
            json!("5"),
            json!(5.5),
            json!(-1),
            json!(true),
            json!(null),
            json!([]),
            json!({"count": 5}),
        ];
        for value in wrong {
            let mut params = SearchParameters::new();
            let err = params.set(Parameter::Count, value.clone()).unwrap_err();
            assert!(
                matches!(err, OpenSearchError::InvalidArgument(_)),
                "{value} should be rejected"
            );
            assert_eq!(params.count(), None);
        }
    }

    #[test]
    fn set_routes_each_parameter_to_its_own_field() {
        for &parameter in Parameter::all() {
            let mut params = SearchParameters::new();
            let value = if parameter.is_integer() {
                json!(7)
            } else {
                json!("x")
            };
            params.set(parameter, value).expect("accepted");
            for &other in Parameter::all() {
                assert_eq!(params.is_set(other), other == parameter, "{parameter} set {other}");
            }
        }
    }

    #[test]
    fn set_rejects_wrong_types_for_start_index_and_start_page() {
        let mut params = SearchParameters::new();
        assert!(params.set(Parameter::StartIndex, json!([])).is_err());
        assert!(params.set(Parameter::StartPage, json!("startPage")).is_err());
        assert_eq!(params.start_index(), None);
        assert_eq!(params.start_page(), None);
    }

    #[test]
    fn set_keeps_previous_value_on_error() {
        let mut params = SearchParameters::new();
        params.set_count(10);
        assert!(params.set(Parameter::Count, json!("20")).is_err());
        assert_eq!(params.count(), Some(10));
    }

    #[test]
    fn set_requires_strings_for_text_parameters() {
        let mut params = SearchParameters::new();
        params.set(Parameter::Language, json!("fr")).expect("language");
        assert_eq!(params.language(), Some("fr"));
        let err = params.set(Parameter::OutputEncoding, json!(8)).unwrap_err();
        assert!(err.to_string().contains("outputEncoding must be a string"));
    }

    #[test]
    fn set_accepts_search_terms_string_or_array() {
        let mut params = SearchParameters::new();
        params
            .set(Parameter::SearchTerms, json!(["open", " search "]))
            .expect("array");
        assert_eq!(params.search_terms(), Some("open+search"));
        params
            .set(Parameter::SearchTerms, json!("single"))
            .expect("string");
        assert_eq!(params.search_terms(), Some("single"));
        assert!(params.set(Parameter::SearchTerms, json!([1, 2])).is_err());
        assert!(params.set(Parameter::SearchTerms, json!(3)).is_err());
    }

    #[test]
    fn get_renders_integers_as_decimal() {
        let mut params = SearchParameters::new();
        params.set_start_index(30);
        assert_eq!(params.get(Parameter::StartIndex), Some("30".to_string()));
    }

    #[test]
    fn serde_uses_camel_case_names() {
        let mut params = SearchParameters::new();
        params.set_search_terms(["rust"]).set_start_page(3);
        let json = serde_json::to_value(&params).expect("serialize");
        assert_eq!(json["searchTerms"], "rust");
        assert_eq!(json["startPage"], 3);
        assert!(json["inputEncoding"].is_null());
    }
}

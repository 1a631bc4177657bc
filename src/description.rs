//! OpenSearch description documents.
//!
//! A description document advertises one `<Url>` element per response
//! format. Only the Atom template is used for searching, but every `Url`
//! and the descriptive metadata are kept for callers that want them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ATOM_MIME_TYPE;
use crate::xml::{XmlDocument, XmlElement};

/// One `<Url>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUrl {
    /// MIME type of the responses this template produces.
    pub mime_type: String,
    /// The templated URL, with XML entities already decoded.
    pub template: String,
    /// Role of the URL (`results`, `suggestions`, ...). OpenSearch treats
    /// an absent `rel` as `results`.
    pub rel: Option<String>,
    /// Index of the first result. Defaults to 1.
    pub index_offset: u64,
    /// Number of the first page. Defaults to 1.
    pub page_offset: u64,
}

impl TemplateUrl {
    fn from_element(element: &XmlElement) -> Option<Self> {
        let offset = |name: &str| {
            element
                .attribute(name)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(1)
        };
        Some(Self {
            mime_type: element.attribute("type")?.trim().to_owned(),
            template: element.attribute("template")?.trim().to_owned(),
            rel: element.attribute("rel").map(str::to_owned),
            index_offset: offset("indexOffset"),
            page_offset: offset("pageOffset"),
        })
    }

    /// Whether this URL returns Atom feeds.
    pub fn is_atom(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(ATOM_MIME_TYPE)
    }
}

/// A parsed description document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionDocument {
    short_name: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    contact: Option<String>,
    language: Option<String>,
    urls: Vec<TemplateUrl>,
}

impl DescriptionDocument {
    /// Parse a description document.
    ///
    /// `<Url>` elements lacking a `type` or `template` attribute are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError::MalformedFeed`](crate::OpenSearchError::MalformedFeed)
    /// if `raw` is not well-formed XML.
    pub fn load(raw: &[u8]) -> Result<Self> {
        let document = XmlDocument::parse(raw)?;
        let root = &document.root;
        let namespace = root.namespace.as_deref();

        let urls: Vec<TemplateUrl> = root
            .children_named(namespace, "Url")
            .filter_map(|element| {
                let url = TemplateUrl::from_element(element);
                if url.is_none() {
                    tracing::debug!("skipping <Url> without type or template");
                }
                url
            })
            .collect();

        let text = |name: &str| {
            root.child_text(namespace, name)
                .filter(|value| !value.is_empty())
        };

        let description = Self {
            short_name: text("ShortName"),
            description: text("Description"),
            tags: text("Tags"),
            contact: text("Contact"),
            language: text("Language"),
            urls,
        };

        tracing::debug!(
            urls = description.urls.len(),
            has_atom = description.template().is_some(),
            "description document parsed"
        );
        Ok(description)
    }

    /// The Atom URL template. When several `Url` elements advertise Atom,
    /// the last one wins.
    pub fn template(&self) -> Option<&str> {
        self.atom_url().map(|url| url.template.as_str())
    }

    /// The `Url` element [`template`](Self::template) comes from.
    pub fn atom_url(&self) -> Option<&TemplateUrl> {
        self.urls.iter().rev().find(|url| url.is_atom())
    }

    /// Every usable `Url` element, in document order.
    pub fn urls(&self) -> &[TemplateUrl] {
        &self.urls
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Space-separated keywords.
    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }

    /// First `<Language>` value, if any.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

//! A single search result parsed from an Atom `<entry>`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::xml::XmlElement;

/// Prefix the Media RSS namespace is conventionally bound to.
pub(crate) const MEDIA_PREFIX: &str = "media";

/// Offset-less date-time layouts, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One search result. Fields are `None` when the source element is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Result title.
    pub title: Option<String>,
    /// `href` of the first `<link>`.
    pub link: Option<String>,
    /// Atom entry id.
    pub id: Option<String>,
    /// Timestamp of the last update. `None` when absent, empty or not a
    /// recognised date.
    pub updated: Option<DateTime<FixedOffset>>,
    /// Timestamp of first publication.
    pub published: Option<DateTime<FixedOffset>>,
    /// Snippet describing the result.
    pub content: Option<String>,
    /// `url` of the first `<media:thumbnail>`.
    pub thumbnail: Option<String>,
}

impl Entry {
    /// Build an entry from an `<entry>` element.
    ///
    /// `atom` is the namespace of the feed's Atom elements and `media` the
    /// URI the document binds the `media` prefix to, if any.
    pub(crate) fn from_element(
        element: &XmlElement,
        atom: Option<&str>,
        media: Option<&str>,
    ) -> Self {
        let text = |name: &str| element.child(atom, name).map(XmlElement::text_content);
        let timestamp = |name: &str| text(name).and_then(|value| parse_timestamp(name, &value));

        let link = element
            .child(atom, "link")
            .and_then(|link| link.attribute("href"))
            .map(str::to_owned);

        let thumbnail = media
            .and_then(|media| element.child(Some(media), "thumbnail"))
            .and_then(|thumbnail| thumbnail.attribute("url"))
            .map(str::to_owned);

        Self {
            title: text("title"),
            link,
            id: text("id"),
            updated: timestamp("updated"),
            published: timestamp("published"),
            content: text("content"),
            thumbnail,
        }
    }
}

/// Parse an entry timestamp.
///
/// Atom mandates RFC 3339, but providers also emit RFC 2822, date-times
/// without an offset and bare dates. The latter two are taken as UTC.
fn parse_timestamp(field: &str, value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let utc = |naive: NaiveDateTime| Utc.from_utc_datetime(&naive).fixed_offset();

    let parsed = DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .or_else(|| {
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(utc)
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(utc)
        });

    if parsed.is_none() {
        tracing::debug!(field, value, "ignoring unrecognised timestamp");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    const ATOM: &str = "http://www.w3.org/2005/Atom";

    fn entry(xml: &str) -> Entry {
        let doc = XmlDocument::parse(xml.as_bytes()).expect("well-formed");
        Entry::from_element(&doc.root, Some(ATOM), doc.namespace_for(MEDIA_PREFIX))
    }

    #[test]
    fn parses_all_fields() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
                 <title>Denton Record-Chronicle</title>
                 <link href="https://example.org/ark:/67531/metapth1/"/>
                 <id>info:ark/67531/metapth1</id>
                 <updated>2014-03-04T12:30:00Z</updated>
                 <published>2013-01-02T08:00:00-06:00</published>
                 <content type="html">Daily newspaper from Denton</content>
                 <media:thumbnail url="https://example.org/thumb.jpg"/>
               </entry>"#,
        );

        assert_eq!(entry.title.as_deref(), Some("Denton Record-Chronicle"));
        assert_eq!(
            entry.link.as_deref(),
            Some("https://example.org/ark:/67531/metapth1/")
        );
        assert_eq!(entry.id.as_deref(), Some("info:ark/67531/metapth1"));
        assert_eq!(
            entry.updated.map(|t| t.to_rfc3339()),
            Some("2014-03-04T12:30:00+00:00".to_string())
        );
        assert_eq!(
            entry.published.map(|t| t.to_rfc3339()),
            Some("2013-01-02T08:00:00-06:00".to_string())
        );
        assert_eq!(entry.content.as_deref(), Some("Daily newspaper from Denton"));
        assert_eq!(entry.thumbnail.as_deref(), Some("https://example.org/thumb.jpg"));
    }

    #[test]
    fn absent_elements_stay_unset() {
        let entry = entry(r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>Only</title></entry>"#);
        assert_eq!(entry.title.as_deref(), Some("Only"));
        assert!(entry.link.is_none());
        assert!(entry.id.is_none());
        assert!(entry.updated.is_none());
        assert!(entry.published.is_none());
        assert!(entry.content.is_none());
        assert!(entry.thumbnail.is_none());
    }

    #[test]
    fn missing_thumbnail_with_media_namespace_is_unset() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/"><id>1</id></entry>"#,
        );
        assert!(entry.thumbnail.is_none());
    }

    #[test]
    fn thumbnail_without_url_is_unset() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/"><media:thumbnail width="75"/></entry>"#,
        );
        assert!(entry.thumbnail.is_none());
    }

    #[test]
    fn thumbnail_resolved_through_media_prefix_binding() {
        // Same local name under a different namespace is not a thumbnail.
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:media="urn:custom-media" xmlns:m="http://search.yahoo.com/mrss/">
                 <m:thumbnail url="https://example.org/wrong.jpg"/>
                 <media:thumbnail url="https://example.org/right.jpg"/>
               </entry>"#,
        );
        assert_eq!(entry.thumbnail.as_deref(), Some("https://example.org/right.jpg"));
    }

    #[test]
    fn first_link_wins() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><link href="https://a.example/"/><link rel="related" href="https://b.example/"/></entry>"#,
        );
        assert_eq!(entry.link.as_deref(), Some("https://a.example/"));
    }

    #[test]
    fn rfc2822_timestamps_accepted() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><updated>Tue, 04 Mar 2014 12:30:00 +0000</updated></entry>"#,
        );
        assert!(entry.updated.is_some());
    }

    #[test]
    fn naive_datetime_is_read_as_utc() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><updated>2014-03-04T12:30:00</updated><published>2014-03-04 08:15:30.5</published></entry>"#,
        );
        assert_eq!(
            entry.updated.map(|t| t.to_rfc3339()),
            Some("2014-03-04T12:30:00+00:00".to_string())
        );
        assert_eq!(
            entry.published.map(|t| t.to_rfc3339()),
            Some("2014-03-04T08:15:30.500+00:00".to_string())
        );
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><updated> 2014-03-04 </updated></entry>"#,
        );
        assert_eq!(
            entry.updated.map(|t| t.to_rfc3339()),
            Some("2014-03-04T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn empty_or_unrecognised_timestamps_are_unset() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><title>Kept</title><updated></updated><published>yesterday-ish</published></entry>"#,
        );
        assert_eq!(entry.title.as_deref(), Some("Kept"));
        assert!(entry.updated.is_none());
        assert!(entry.published.is_none());
    }

    #[test]
    fn xhtml_content_collects_descendant_text() {
        let entry = entry(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">A <b>bold</b> claim</div></content></entry>"#,
        );
        assert_eq!(entry.content.as_deref(), Some("A bold claim"));
    }
}

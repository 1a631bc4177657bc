//! Minimal owned XML tree with resolved namespaces.
//!
//! Description documents and response feeds are small, so they are read
//! once with [`quick_xml::NsReader`] into an [`XmlElement`] tree. Each
//! element records the namespace URI its name resolved to, which lets
//! callers query by `(namespace, local name)` instead of by prefix.

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;

use crate::error::{OpenSearchError, Result};

/// An element with its attributes, direct text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Namespace URI the element name resolved to, if any.
    pub namespace: Option<String>,
    /// Local name without prefix.
    pub name: String,
    /// Attributes keyed by their unprefixed local name. Namespace
    /// declarations are not included.
    pub attributes: BTreeMap<String, String>,
    /// Text and CDATA content before the first child element.
    pub text: String,
    /// Text following this element, up to its parent's next child.
    pub tail: String,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Whether this element has the given namespace and local name.
    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    /// Children in `namespace` named `name`.
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// First child in `namespace` named `name`.
    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// Trimmed text of the first matching child.
    pub fn child_text(&self, namespace: Option<&str>, name: &str) -> Option<String> {
        self.child(namespace, name).map(|c| c.text.trim().to_owned())
    }

    /// Text of this element and all its descendants, trimmed.
    pub fn text_content(&self) -> String {
        fn collect(element: &XmlElement, out: &mut String) {
            out.push_str(&element.text);
            for child in &element.children {
                collect(child, out);
                out.push_str(&child.tail);
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out.trim().to_owned()
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A parsed document: the root element plus every prefix declared
/// anywhere in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
    /// Prefix → namespace URI. The first declaration of a prefix wins.
    pub namespaces: BTreeMap<String, String>,
}

impl XmlDocument {
    /// Parse `raw` into an owned tree.
    ///
    /// # Errors
    ///
    /// Text is decoded with the encoding named in the XML declaration.
    /// Entities declared in the DOCTYPE internal subset are expanded;
    /// references to undeclared entities are kept as literal text.
    ///
    /// Returns [`OpenSearchError::MalformedFeed`] if the input is not
    /// well-formed: mismatched or unclosed tags, no root element, content
    /// after the root element, or bytes invalid in the declared encoding.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut reader = NsReader::from_reader(raw);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut namespaces = BTreeMap::new();
        let mut entities: BTreeMap<String, String> = BTreeMap::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let position = reader.buffer_position();
            let decoder = reader.decoder();
            let (namespace, event) = match reader.read_resolved_event_into(&mut buf) {
                Ok((resolved, event)) => (resolved_namespace(decoder, resolved)?, event),
                Err(e) => return Err(malformed(format!("{e} (near byte {position})"))),
            };

            match event {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(malformed("content after the root element"));
                    }
                    let element = open_element(decoder, namespace, &start, &mut namespaces, &entities)?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    if root.is_some() {
                        return Err(malformed("content after the root element"));
                    }
                    let element = open_element(decoder, namespace, &start, &mut namespaces, &entities)?;
                    close_element(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("closing tag without opening tag"))?;
                    close_element(element, &mut stack, &mut root);
                }
                Event::DocType(doctype) => {
                    let declarations = doctype
                        .decode()
                        .map_err(|e| malformed(format!("invalid DOCTYPE: {e}")))?;
                    entities.extend(internal_entities(&declarations));
                }
                Event::Text(text) => {
                    let value = text
                        .xml10_content()
                        .map_err(|e| malformed(format!("invalid text: {e}")))?;
                    push_text(&mut stack, &value)?;
                }
                Event::CData(cdata) => {
                    let value = cdata
                        .decode()
                        .map_err(|e| malformed(format!("invalid CDATA: {e}")))?;
                    push_text(&mut stack, &value)?;
                }
                Event::GeneralRef(reference) => {
                    let value = resolve_reference(&reference, &entities)?;
                    push_text(&mut stack, &value)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(malformed(format!(
                "unexpected end of document inside <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }
        let root = root.ok_or_else(|| malformed("document has no root element"))?;

        tracing::trace!(root = %root.name, namespaces = namespaces.len(), "XML document parsed");
        Ok(Self { root, namespaces })
    }

    /// Namespace URI declared for `prefix`, if any.
    pub fn namespace_for(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }
}

fn malformed(message: impl Into<String>) -> OpenSearchError {
    OpenSearchError::MalformedFeed(message.into())
}

/// Namespace URI an element name resolved to. Only element names are
/// resolved here, so an unknown prefix means the document is malformed.
fn resolved_namespace(decoder: Decoder, resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => decode(decoder, ns.as_ref(), "namespace URI").map(Some),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(malformed(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn open_element(
    decoder: Decoder,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    namespaces: &mut BTreeMap<String, String>,
    entities: &BTreeMap<String, String>,
) -> Result<XmlElement> {
    let name = decode(decoder, start.local_name().as_ref(), "element name")?;

    let mut attributes = BTreeMap::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(format!("invalid attribute: {e}")))?;
        let value = attribute
            .decode_and_unescape_value_with(decoder, |entity| {
                entities
                    .get(entity)
                    .map(String::as_str)
                    .or_else(|| resolve_predefined_entity(entity))
            })
            .map_err(|e| malformed(format!("invalid attribute value: {e}")))?
            .into_owned();

        match attribute.key.as_namespace_binding() {
            Some(PrefixDeclaration::Named(prefix)) => {
                let prefix = decode(decoder, prefix, "namespace prefix")?;
                namespaces.entry(prefix).or_insert(value);
                continue;
            }
            Some(PrefixDeclaration::Default) => continue,
            None => {}
        }

        let key = decode(decoder, attribute.key.local_name().as_ref(), "attribute name")?;
        attributes.insert(key, value);
    }

    Ok(XmlElement {
        namespace,
        name,
        attributes,
        text: String::new(),
        tail: String::new(),
        children: Vec::new(),
    })
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(current) => match current.children.last_mut() {
            Some(previous) => previous.tail.push_str(text),
            None => current.text.push_str(text),
        },
        None if text.trim().is_empty() => {}
        None => return Err(malformed("text outside the root element")),
    }
    Ok(())
}

fn resolve_reference(
    reference: &BytesRef<'_>,
    entities: &BTreeMap<String, String>,
) -> Result<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| malformed(format!("invalid character reference: {e}")))?
    {
        return Ok(ch.to_string());
    }
    let name = reference
        .decode()
        .map_err(|e| malformed(format!("invalid entity name: {e}")))?;
    if let Some(value) = entities.get(&*name) {
        return Ok(value.clone());
    }
    if let Some(value) = resolve_predefined_entity(&name) {
        return Ok(value.to_owned());
    }
    tracing::trace!(entity = %name, "keeping undeclared entity reference as text");
    Ok(format!("&{name};"))
}

/// General entities declared in a DOCTYPE internal subset, such as
/// `<!ENTITY nbsp "&#160;">`. Parameter entities and external entities
/// are skipped.
fn internal_entities(doctype: &str) -> Vec<(String, String)> {
    const DECLARATION: &str = "<!ENTITY";

    let mut entities = Vec::new();
    let mut rest = doctype;
    while let Some(start) = rest.find(DECLARATION) {
        rest = rest[start + DECLARATION.len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(end) = rest[1..].find(quote) else {
            break;
        };
        let raw = &rest[1..=end];
        rest = &rest[end + 2..];

        if name.is_empty() {
            continue;
        }
        let value = quick_xml::escape::unescape(raw)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| raw.to_owned());
        entities.push((name.to_owned(), value));
    }
    entities
}

fn decode(decoder: Decoder, bytes: &[u8], what: &str) -> Result<String> {
    decoder
        .decode(bytes)
        .map(Cow::into_owned)
        .map_err(|e| malformed(format!("invalid {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> XmlDocument {
        parse_bytes(xml.as_bytes())
    }

    fn parse_bytes(xml: &[u8]) -> XmlDocument {
        XmlDocument::parse(xml).expect("well-formed XML")
    }

    #[test]
    fn resolves_default_and_prefixed_namespaces() {
        let doc = parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:os="http://a9.com/-/spec/opensearch/1.1/">
                 <os:totalResults>5</os:totalResults>
                 <title>Example</title>
               </feed>"#,
        );
        assert!(doc.root.is(Some("http://www.w3.org/2005/Atom"), "feed"));
        assert_eq!(
            doc.root
                .child_text(Some("http://a9.com/-/spec/opensearch/1.1/"), "totalResults"),
            Some("5".to_string())
        );
        assert_eq!(
            doc.root.child_text(Some("http://www.w3.org/2005/Atom"), "title"),
            Some("Example".to_string())
        );
        assert_eq!(
            doc.namespace_for("os"),
            Some("http://a9.com/-/spec/opensearch/1.1/")
        );
    }

    #[test]
    fn collects_prefixes_declared_on_nested_elements() {
        let doc = parse(
            r#"<root><item xmlns:media="http://search.yahoo.com/mrss/"><media:thumbnail url="x"/></item></root>"#,
        );
        assert_eq!(doc.namespace_for("media"), Some("http://search.yahoo.com/mrss/"));
        let item = doc.root.child(None, "item").expect("item");
        let thumb = item
            .child(Some("http://search.yahoo.com/mrss/"), "thumbnail")
            .expect("thumbnail");
        assert_eq!(thumb.attribute("url"), Some("x"));
    }

    #[test]
    fn unescapes_text_and_attributes() {
        let doc = parse(r#"<a href="?q=1&amp;b=2">Fish &amp; Chips &#169;<![CDATA[ <raw> ]]></a>"#);
        assert_eq!(doc.root.attribute("href"), Some("?q=1&b=2"));
        assert_eq!(doc.root.text, "Fish & Chips \u{a9} <raw> ");
    }

    #[test]
    fn decodes_text_in_declared_encoding() {
        let doc = parse_bytes(
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><feed title=\"D\xe9j\xe0\"><title>Caf\xe9</title></feed>",
        );
        assert_eq!(doc.root.child_text(None, "title"), Some("Caf\u{e9}".to_string()));
        assert_eq!(doc.root.attribute("title"), Some("D\u{e9}j\u{e0}"));
    }

    #[test]
    fn expands_entities_declared_in_doctype() {
        let doc = parse(
            r#"<!DOCTYPE feed [
                 <!ENTITY nbsp "&#160;">
                 <!ENTITY % param "ignored">
                 <!ENTITY site 'UNT'>
               ]>
               <feed label="&site;">A&nbsp;B &site;</feed>"#,
        );
        assert_eq!(doc.root.text, "A\u{a0}B UNT");
        assert_eq!(doc.root.attribute("label"), Some("UNT"));
    }

    #[test]
    fn undeclared_entity_is_kept_as_text() {
        let doc = parse("<a>x &copy; y</a>");
        assert_eq!(doc.root.text, "x &copy; y");
    }

    #[test]
    fn internal_entities_skips_parameter_and_external_declarations() {
        let entities = internal_entities(
            r#"feed [<!ENTITY % p "x"><!ENTITY ext SYSTEM "ext.ent"><!ENTITY amp2 "&amp;&amp;">]"#,
        );
        assert_eq!(entities, vec![("amp2".to_string(), "&&".to_string())]);
    }

    #[test]
    fn text_content_includes_descendants() {
        let doc = parse("<content> Hello <b>bold</b> world </content>");
        assert_eq!(doc.root.text_content(), "Hello bold world");
        assert_eq!(doc.root.text, " Hello ");
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = XmlDocument::parse(b"<a><b></a></b>").unwrap_err();
        assert!(matches!(err, OpenSearchError::MalformedFeed(_)));
    }

    #[test]
    fn rejects_unclosed_root() {
        let err = XmlDocument::parse(b"<feed><entry></entry>").unwrap_err();
        assert!(matches!(err, OpenSearchError::MalformedFeed(_)));
    }

    #[test]
    fn rejects_empty_and_non_xml_input() {
        assert!(XmlDocument::parse(b"").is_err());
        assert!(XmlDocument::parse(b"not xml at all").is_err());
    }

    #[test]
    fn rejects_undeclared_prefix() {
        let err = XmlDocument::parse(b"<media:thumbnail url=\"x\"/>").unwrap_err();
        assert!(err.to_string().contains("undeclared namespace prefix"));
    }

    #[test]
    fn rejects_second_root() {
        assert!(XmlDocument::parse(b"<a/><b/>").is_err());
    }

    #[test]
    fn children_named_filters_by_namespace() {
        let doc = parse(r#"<r xmlns:x="urn:x"><e/><x:e/><e/></r>"#);
        assert_eq!(doc.root.children_named(None, "e").count(), 2);
        assert_eq!(doc.root.children_named(Some("urn:x"), "e").count(), 1);
    }
}

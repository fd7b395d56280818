//! Format dispatch: picks the schema and converter for a document.
//!
//! Detection is by top-level shape, checked in a fixed order so that an
//! ambiguous document always resolves the same way:
//!
//! 1. JSON content → JSON Feed
//! 2. a `feed` root → Atom
//! 3. an `rdf:RDF` root → RSS 1.0
//! 4. an `rss` root → RSS 2.0

use std::fmt;

use serde_json::Value;

use super::atom::AtomDocument;
use super::convert::{atom_to_json_feed, rss1_to_json_feed, rss2_to_json_feed};
use super::error::FeedError;
use super::json_feed::JsonFeed;
use super::node::{parse_xml, Node};
use super::rss1::Rss1Document;
use super::rss2::Rss2Document;
use super::schema::{Element, FromElement};

/// A generically parsed document, before its format is known.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Xml(Node),
    Json(Value),
}

/// The wire formats understood by [`parse_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Atom,
    Rss1,
    Rss2,
    JsonFeed,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Atom => "Atom",
            Format::Rss1 => "RSS 1.0",
            Format::Rss2 => "RSS 2.0",
            Format::JsonFeed => "JSON Feed",
        };
        f.write_str(name)
    }
}

/// Determines the format of a document without validating it.
///
/// Returns `None` for an XML document with none of the known roots.
pub fn detect(document: &Document) -> Option<Format> {
    match document {
        Document::Json(_) => Some(Format::JsonFeed),
        Document::Xml(node) if node.has_child("feed") => Some(Format::Atom),
        Document::Xml(node) if node.has_child("rdf:RDF") => Some(Format::Rss1),
        Document::Xml(node) if node.has_child("rss") => Some(Format::Rss2),
        Document::Xml(_) => None,
    }
}

/// Validates and converts a parsed document into the canonical feed.
///
/// # Errors
///
/// - [`FeedError::UnknownFormat`] if no known root is present
/// - [`FeedError::Structure`] / [`FeedError::Date`] if validation or
///   conversion fails
/// - [`FeedError::Json`] if a JSON document does not have the JSON Feed shape
pub fn parse_document(document: Document) -> Result<JsonFeed, FeedError> {
    let format = detect(&document).ok_or_else(|| match &document {
        Document::Xml(node) => FeedError::UnknownFormat(describe_roots(node)),
        Document::Json(_) => FeedError::UnknownFormat("JSON".into()),
    })?;
    tracing::debug!(format = %format, "Detected feed format");

    let feed = match (format, document) {
        (_, Document::Json(value)) => JsonFeed::from_value(value)?,
        (Format::Atom, Document::Xml(node)) => {
            atom_to_json_feed(AtomDocument::from_element(&Element::root(&node))?)?
        }
        (Format::Rss1, Document::Xml(node)) => {
            rss1_to_json_feed(Rss1Document::from_element(&Element::root(&node))?)?
        }
        (Format::Rss2, Document::Xml(node)) => {
            rss2_to_json_feed(Rss2Document::from_element(&Element::root(&node))?)?
        }
        (Format::JsonFeed, Document::Xml(_)) => {
            return Err(FeedError::UnknownFormat(
                "JSON Feed content in an XML document".into(),
            ))
        }
    };

    tracing::debug!(
        format = %format,
        title = %feed.title,
        items = feed.items.len(),
        "Normalized feed"
    );
    Ok(feed)
}

/// Parses raw bytes, using the declared content type to select JSON.
///
/// A `Content-Type` of `application/json` or `application/feed+json`
/// (case-insensitive, parameters ignored) selects JSON; anything else,
/// including no content type, is parsed as XML.
///
/// # Errors
///
/// Everything [`parse_document`] returns, plus [`FeedError::Xml`] for
/// malformed or non-UTF-8 XML and [`FeedError::Json`] for malformed JSON.
pub fn parse_bytes(bytes: &[u8], content_type: Option<&str>) -> Result<JsonFeed, FeedError> {
    let document = if content_type.is_some_and(is_json_media_type) {
        Document::Json(serde_json::from_slice(bytes)?)
    } else {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| FeedError::Xml(format!("document is not valid UTF-8: {}", e)))?;
        Document::Xml(parse_xml(text)?)
    };
    parse_document(document)
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence.eq_ignore_ascii_case("application/feed+json")
}

fn describe_roots(node: &Node) -> String {
    let names: Vec<&str> = node.children.keys().map(String::as_str).collect();
    if names.is_empty() {
        "document has no root element".to_string()
    } else {
        format!("unrecognized root element <{}>", names.join(">, <"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ATOM: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
<title>t</title><id>urn:x</id><updated>2024-01-01T00:00:00Z</updated>
<link href="https://example.com/"/></feed>"#;

    const RSS2: &str = r#"<rss version="2.0"><channel><title>t</title>
<link>https://example.com/</link><description>d</description></channel></rss>"#;

    fn minimal_channel() -> Node {
        Node::element()
            .with_child("title", Node::element().with_text("t"))
            .with_child("link", Node::element().with_text("https://example.com/"))
            .with_child("description", Node::element())
    }

    #[test]
    fn test_detect_by_root() {
        let atom = Document::Xml(parse_xml(ATOM).unwrap());
        let rss2 = Document::Xml(parse_xml(RSS2).unwrap());
        let json = Document::Json(json!({}));
        assert_eq!(detect(&atom), Some(Format::Atom));
        assert_eq!(detect(&rss2), Some(Format::Rss2));
        assert_eq!(detect(&json), Some(Format::JsonFeed));
        assert_eq!(
            detect(&Document::Xml(parse_xml("<html/>").unwrap())),
            None
        );
    }

    #[test]
    fn test_ambiguous_document_resolves_in_fixed_order() {
        let rss = Node::element().with_child("channel", minimal_channel());
        let rdf = Node::element();
        let both = Node::element()
            .with_child("rss", rss.clone())
            .with_child("rdf:RDF", rdf);
        assert_eq!(detect(&Document::Xml(both.clone())), Some(Format::Rss1));

        // RSS 1.0 wins and then fails its own validation: no fallthrough to RSS 2.0.
        let err = parse_document(Document::Xml(both)).unwrap_err();
        match err {
            FeedError::Structure(e) => assert_eq!(e.path, "rdf:RDF.channel"),
            other => panic!("unexpected error: {other:?}"),
        }

        let atom_root = parse_xml(ATOM).unwrap().children["feed"][0].clone();
        let all = Node::element()
            .with_child("rss", rss)
            .with_child("feed", atom_root);
        assert_eq!(detect(&Document::Xml(all.clone())), Some(Format::Atom));
        assert_eq!(parse_document(Document::Xml(all)).unwrap().title, "t");
    }

    #[test]
    fn test_unknown_root_rejected() {
        let err = parse_bytes(b"<html><body/></html>", None).unwrap_err();
        match err {
            FeedError::UnknownFormat(message) => assert!(message.contains("<html>")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_selected_by_content_type() {
        let body = br#"{"title":"j","items":[{"id":"1"}]}"#;
        for content_type in [
            "application/json",
            "application/feed+json",
            "Application/Feed+JSON; charset=utf-8",
        ] {
            let feed = parse_bytes(body, Some(content_type)).unwrap();
            assert_eq!(feed.title, "j", "{}", content_type);
        }

        // Without a JSON content type the body is read as XML and fails there.
        assert!(matches!(
            parse_bytes(body, Some("text/plain")).unwrap_err(),
            FeedError::Xml(_)
        ));
    }

    #[test]
    fn test_xml_formats_route_to_converters() {
        let feed = parse_bytes(ATOM.as_bytes(), Some("application/atom+xml")).unwrap();
        assert_eq!(feed.home_page_url.as_deref(), Some("https://example.com/"));
        let feed = parse_bytes(RSS2.as_bytes(), None).unwrap();
        assert_eq!(feed.description.as_deref(), Some("d"));
    }

    #[test]
    fn test_structure_and_date_errors_surface() {
        let missing_title = RSS2.replace("<title>t</title>", "");
        match parse_bytes(missing_title.as_bytes(), None).unwrap_err() {
            FeedError::Structure(e) => assert_eq!(e.path, "rss.channel.title"),
            other => panic!("unexpected error: {other:?}"),
        }

        let bad_date = ATOM.replace("2024-01-01T00:00:00Z", "yesterday");
        match parse_bytes(bad_date.as_bytes(), None).unwrap_err() {
            FeedError::Date { path, .. } => assert_eq!(path, "feed.updated"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

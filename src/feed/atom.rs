//! Atom (RFC 4287) structural schema.

use super::node::Node;
use super::schema::{
    Element, EmptyElement, FromAttributes, FromElement, Rfc3339Text, SchemaResult, Text,
    TextElement,
};
use super::error::StructureError;

/// `<feed>` at the document root.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomDocument {
    pub feed: AtomFeed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomFeed {
    pub lang: Option<String>,
    pub authors: Vec<Person>,
    pub categories: Vec<EmptyElement<Category>>,
    pub contributors: Vec<Person>,
    pub generator: Option<TextElement<String, Generator>>,
    pub icon: Option<Text>,
    pub id: Text,
    pub links: Vec<EmptyElement<Link>>,
    pub logo: Option<Text>,
    pub rights: Option<TextConstruct>,
    pub subtitle: Option<TextConstruct>,
    pub title: TextConstruct,
    pub updated: Rfc3339Text,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub authors: Vec<Person>,
    pub categories: Vec<EmptyElement<Category>>,
    pub content: Option<Content>,
    pub contributors: Vec<Person>,
    pub id: Text,
    pub links: Vec<EmptyElement<Link>>,
    pub published: Option<Rfc3339Text>,
    pub rights: Option<TextConstruct>,
    pub source: Option<Source>,
    pub summary: Option<TextConstruct>,
    pub title: TextConstruct,
    pub updated: Rfc3339Text,
}

/// `<source>`: metadata of the feed an entry was copied from. Everything is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub authors: Vec<Person>,
    pub categories: Vec<EmptyElement<Category>>,
    pub contributors: Vec<Person>,
    pub generator: Option<TextElement<String, Generator>>,
    pub icon: Option<Text>,
    pub id: Option<Text>,
    pub links: Vec<EmptyElement<Link>>,
    pub logo: Option<Text>,
    pub rights: Option<TextConstruct>,
    pub subtitle: Option<TextConstruct>,
    pub title: Option<TextConstruct>,
    pub updated: Option<Rfc3339Text>,
}

/// Person construct (`author`, `contributor`).
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: Text,
    pub uri: Option<Text>,
    pub email: Option<Text>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub term: String,
    pub scheme: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub uri: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    /// Defaults to `alternate` when absent.
    pub rel: String,
    pub mime_type: Option<String>,
    pub hreflang: Option<String>,
    pub title: Option<String>,
    pub length: Option<String>,
}

/// Whether a plain text construct carries text or escaped HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Text,
    Html,
}

/// Text construct (`title`, `subtitle`, `summary`, `rights`).
#[derive(Debug, Clone, PartialEq)]
pub enum TextConstruct {
    Plain { kind: TextKind, text: String },
    Xhtml { div: Option<Node>, text: String },
}

/// `<content>`: a text construct, an out-of-line reference, or anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(TextConstruct),
    OutOfLine { src: String, mime_type: String },
    Other,
}

impl TextConstruct {
    /// Flattened text regardless of the construct's kind.
    pub fn text(&self) -> &str {
        match self {
            TextConstruct::Plain { text, .. } | TextConstruct::Xhtml { text, .. } => text,
        }
    }
}

impl FromElement for AtomDocument {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            feed: el.child("feed")?,
        })
    }
}

impl FromElement for AtomFeed {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            lang: el.optional_attribute("xml:lang"),
            authors: el.optional_list("author")?,
            categories: el.optional_list("category")?,
            contributors: el.optional_list("contributor")?,
            generator: el.optional_child("generator")?,
            icon: el.optional_child("icon")?,
            id: el.child("id")?,
            links: el.list("link")?,
            logo: el.optional_child("logo")?,
            rights: el.optional_child("rights")?,
            subtitle: el.optional_child("subtitle")?,
            title: el.child("title")?,
            updated: el.child("updated")?,
            entries: el.optional_list("entry")?,
        })
    }
}

impl FromElement for Entry {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            authors: el.optional_list("author")?,
            categories: el.optional_list("category")?,
            content: el.optional_child("content")?,
            contributors: el.optional_list("contributor")?,
            id: el.child("id")?,
            links: el.list("link")?,
            published: el.optional_child("published")?,
            rights: el.optional_child("rights")?,
            source: el.optional_child("source")?,
            summary: el.optional_child("summary")?,
            title: el.child("title")?,
            updated: el.child("updated")?,
        })
    }
}

impl FromElement for Source {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            authors: el.optional_list("author")?,
            categories: el.optional_list("category")?,
            contributors: el.optional_list("contributor")?,
            generator: el.optional_child("generator")?,
            icon: el.optional_child("icon")?,
            id: el.optional_child("id")?,
            links: el.optional_list("link")?,
            logo: el.optional_child("logo")?,
            rights: el.optional_child("rights")?,
            subtitle: el.optional_child("subtitle")?,
            title: el.optional_child("title")?,
            updated: el.optional_child("updated")?,
        })
    }
}

impl FromElement for Person {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            name: el.child("name")?,
            uri: el.optional_child("uri")?,
            email: el.optional_child("email")?,
        })
    }
}

impl FromAttributes for Category {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            term: el.attribute("term")?,
            scheme: el.optional_attribute("scheme"),
            label: el.optional_attribute("label"),
        })
    }
}

impl FromAttributes for Generator {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            uri: el.optional_attribute("uri"),
            version: el.optional_attribute("version"),
        })
    }
}

impl FromAttributes for Link {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            href: el.attribute("href")?,
            rel: el.attribute_or("rel", "alternate"),
            mime_type: el.optional_attribute("type"),
            hreflang: el.optional_attribute("hreflang"),
            title: el.optional_attribute("title"),
            length: el.optional_attribute("length"),
        })
    }
}

impl FromElement for TextConstruct {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        match el.optional_attribute("type").as_deref() {
            None | Some("") | Some("text") => Ok(TextConstruct::Plain {
                kind: TextKind::Text,
                text: el.text().to_string(),
            }),
            Some("html") => Ok(TextConstruct::Plain {
                kind: TextKind::Html,
                text: el.text().to_string(),
            }),
            Some("xhtml") => Ok(TextConstruct::Xhtml {
                div: el.optional_child("div")?,
                text: el.node().text_content(),
            }),
            Some(other) => Err(StructureError::invalid(
                format!("{}.@type", el.path()),
                format!("text construct type must be text, html or xhtml, found {:?}", other),
            )),
        }
    }
}

impl FromElement for Content {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        if let Ok(construct) = TextConstruct::from_element(el) {
            return Ok(Content::Text(construct));
        }
        match (el.optional_attribute("src"), el.optional_attribute("type")) {
            (Some(src), Some(mime_type)) if el.node().text().is_none() => {
                Ok(Content::OutOfLine { src, mime_type })
            }
            _ => Ok(Content::Other),
        }
    }
}

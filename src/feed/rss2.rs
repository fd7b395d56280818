//! RSS 2.0 structural schema.
//!
//! Items are validated permissively: none of an item's fields is required
//! on its own, and items lacking both `title` and `description` are still
//! accepted because too many real-world feeds publish them.

use super::node::Node;
use super::schema::{
    Element, EmptyElement, FromAttributes, FromElement, Rfc822Text, SchemaResult, Text,
    TextElement,
};

/// `<rss>` at the document root.
#[derive(Debug, Clone, PartialEq)]
pub struct Rss2Document {
    pub rss: Rss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rss {
    pub version: Option<String>,
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub title: Text,
    pub link: Text,
    pub description: Text,
    pub language: Option<Text>,
    pub copyright: Option<Text>,
    pub managing_editor: Option<Text>,
    pub web_master: Option<Text>,
    pub pub_date: Option<Rfc822Text>,
    pub last_build_date: Option<Rfc822Text>,
    pub categories: Vec<TextElement<String, Domain>>,
    pub generator: Option<Text>,
    pub docs: Option<Text>,
    pub cloud: Option<EmptyElement<Cloud>>,
    pub ttl: Option<Text>,
    pub image: Option<Image>,
    pub text_input: Option<TextInput>,
    pub skip_hours: Option<Node>,
    pub skip_days: Option<Node>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cloud {
    pub domain: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
    pub register_procedure: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub url: Text,
    pub title: Text,
    pub link: Text,
    pub width: Option<Text>,
    pub height: Option<Text>,
    pub description: Option<Text>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub title: Text,
    pub description: Text,
    pub name: Text,
    pub link: Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub title: Option<Text>,
    pub description: Option<Text>,
    pub link: Option<Text>,
    pub author: Option<Text>,
    pub categories: Vec<TextElement<String, Domain>>,
    pub comments: Option<Text>,
    pub enclosure: Option<EmptyElement<Enclosure>>,
    pub guid: Option<TextElement<String, Guid>>,
    pub pub_date: Option<Rfc822Text>,
    pub source: Option<TextElement<String, SourceUrl>>,
}

/// `category@domain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    pub length: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guid {
    /// Absent means `true`.
    pub is_perma_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    pub url: Option<String>,
}

impl FromElement for Rss2Document {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            rss: el.child("rss")?,
        })
    }
}

impl FromElement for Rss {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            version: el.optional_attribute("version"),
            channel: el.child("channel")?,
        })
    }
}

impl FromElement for Channel {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            title: el.child("title")?,
            link: el.child("link")?,
            description: el.child("description")?,
            language: el.optional_child("language")?,
            copyright: el.optional_child("copyright")?,
            managing_editor: el.optional_child("managingEditor")?,
            web_master: el.optional_child("webMaster")?,
            pub_date: el.optional_child("pubDate")?,
            last_build_date: el.optional_child("lastBuildDate")?,
            categories: el.optional_list("category")?,
            generator: el.optional_child("generator")?,
            docs: el.optional_child("docs")?,
            cloud: el.optional_child("cloud")?,
            ttl: el.optional_child("ttl")?,
            image: el.optional_child("image")?,
            text_input: el.optional_child("textInput")?,
            skip_hours: el.optional_child("skipHours")?,
            skip_days: el.optional_child("skipDays")?,
            items: el.optional_list("item")?,
        })
    }
}

impl FromAttributes for Cloud {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            domain: el.optional_attribute("domain"),
            port: el.optional_attribute("port"),
            path: el.optional_attribute("path"),
            register_procedure: el.optional_attribute("registerProcedure"),
            protocol: el.optional_attribute("protocol"),
        })
    }
}

impl FromElement for Image {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            url: el.child("url")?,
            title: el.child("title")?,
            link: el.child("link")?,
            width: el.optional_child("width")?,
            height: el.optional_child("height")?,
            description: el.optional_child("description")?,
        })
    }
}

impl FromElement for TextInput {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            title: el.child("title")?,
            description: el.child("description")?,
            name: el.child("name")?,
            link: el.child("link")?,
        })
    }
}

impl FromElement for Item {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            title: el.optional_child("title")?,
            description: el.optional_child("description")?,
            link: el.optional_child("link")?,
            author: el.optional_child("author")?,
            categories: el.optional_list("category")?,
            comments: el.optional_child("comments")?,
            enclosure: el.optional_child("enclosure")?,
            guid: el.optional_child("guid")?,
            pub_date: el.optional_child("pubDate")?,
            source: el.optional_child("source")?,
        })
    }
}

impl FromAttributes for Domain {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            domain: el.optional_attribute("domain"),
        })
    }
}

impl FromAttributes for Enclosure {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            url: el.attribute("url")?,
            length: el.attribute("length")?,
            mime_type: el.attribute("type")?,
        })
    }
}

impl FromAttributes for Guid {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            is_perma_link: el.optional_attribute("isPermaLink"),
        })
    }
}

impl FromAttributes for SourceUrl {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            url: el.optional_attribute("url"),
        })
    }
}

impl Guid {
    pub fn is_perma_link(&self) -> bool {
        !matches!(self.is_perma_link.as_deref(), Some("false"))
    }
}

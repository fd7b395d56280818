//! RSS 1.0 (RDF Site Summary) structural schema.

use super::schema::{Element, EmptyElement, FromAttributes, FromElement, Rfc3339Text, SchemaResult, Text};

/// `<rdf:RDF>` at the document root.
#[derive(Debug, Clone, PartialEq)]
pub struct Rss1Document {
    pub rdf: Rdf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rdf {
    pub channel: Channel,
    pub image: Option<Image>,
    pub items: Vec<Item>,
    pub textinput: Option<TextInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub about: String,
    pub title: Text,
    pub link: Text,
    pub description: Text,
    pub image: Option<EmptyElement<Resource>>,
    pub items: Sequence,
    pub textinput: Option<EmptyElement<Resource>>,
    pub language: Option<Text>,
}

/// `<items><rdf:Seq><rdf:li rdf:resource="..."/>...</rdf:Seq></items>`
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub resources: Vec<EmptyElement<Resource>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub about: String,
    pub title: Text,
    pub link: Text,
    pub url: Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub about: String,
    pub title: Text,
    pub link: Text,
    pub description: Option<Text>,
    pub date: Option<Rfc3339Text>,
    pub creator: Option<Text>,
    pub subjects: Vec<Text>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub about: String,
    pub title: Text,
    pub description: Text,
    pub name: Text,
    pub link: Text,
}

impl FromElement for Rss1Document {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            rdf: el.child("rdf:RDF")?,
        })
    }
}

impl FromElement for Rdf {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            channel: el.child("channel")?,
            image: el.optional_child("image")?,
            items: el.list("item")?,
            textinput: el.optional_child("textinput")?,
        })
    }
}

impl FromElement for Channel {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            about: el.attribute("rdf:about")?,
            title: el.child("title")?,
            link: el.child("link")?,
            description: el.child("description")?,
            image: el.optional_child("image")?,
            items: el.child("items")?,
            textinput: el.optional_child("textinput")?,
            language: el.optional_child("dc:language")?,
        })
    }
}

impl FromElement for Sequence {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        let seq: SeqElement = el.child("rdf:Seq")?;
        Ok(Self {
            resources: seq.items,
        })
    }
}

struct SeqElement {
    items: Vec<EmptyElement<Resource>>,
}

impl FromElement for SeqElement {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            items: el.list("rdf:li")?,
        })
    }
}

impl FromAttributes for Resource {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            resource: el.attribute("rdf:resource")?,
        })
    }
}

impl FromElement for Image {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            about: el.attribute("rdf:about")?,
            title: el.child("title")?,
            link: el.child("link")?,
            url: el.child("url")?,
        })
    }
}

impl FromElement for Item {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            about: el.attribute("rdf:about")?,
            title: el.child("title")?,
            link: el.child("link")?,
            description: el.optional_child("description")?,
            date: el.optional_child("dc:date")?,
            creator: el.optional_child("dc:creator")?,
            subjects: el.optional_list("dc:subject")?,
        })
    }
}

impl FromElement for TextInput {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(Self {
            about: el.attribute("rdf:about")?,
            title: el.child("title")?,
            description: el.child("description")?,
            name: el.child("name")?,
            link: el.child("link")?,
        })
    }
}

//! Structural validation combinators over [`Node`].
//!
//! Four shapes cover every element of the XML feed formats:
//!
//! - [`empty_element`] - attributes only, no text
//! - [`text_element`] - attributes plus a text payload validated by a [`TextSchema`]
//! - [`node_element`] - a record of named children (any [`FromElement`] type)
//! - [`list_element`] - one or many children, always normalized to a non-empty `Vec`
//!
//! Unknown children and attributes are ignored so that extensions a feed
//! adds never cause rejection. Failures carry the path of the offending
//! element, e.g. `feed.entry[2].link[0].@href`.

use chrono::{DateTime, Utc};

use super::date;
use super::error::{StructureError, StructureErrorKind};
use super::node::Node;

pub type SchemaResult<T> = Result<T, StructureError>;

/// A node paired with the path it was reached by.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    node: &'a Node,
    path: String,
}

/// Types validated from a whole element (the `nodeElement` shape, and the
/// wrappers for the other three).
pub trait FromElement: Sized {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self>;
}

/// Types validated from an element's attributes alone.
pub trait FromAttributes: Sized {
    fn from_attributes(el: &Element<'_>) -> SchemaResult<Self>;
}

/// Validation (and possibly transformation) of a text payload.
pub trait TextSchema: Sized {
    fn parse_text(text: &str) -> Result<Self, StructureErrorKind>;
}

impl<'a> Element<'a> {
    pub fn new(node: &'a Node, path: impl Into<String>) -> Self {
        Self {
            node,
            path: path.into(),
        }
    }

    /// The document node, with an empty path.
    pub fn root(node: &'a Node) -> Self {
        Self::new(node, String::new())
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    pub fn attribute(&self, name: &str) -> SchemaResult<String> {
        self.optional_attribute(name).ok_or_else(|| {
            StructureError::new(
                self.child_path(&format!("@{}", name)),
                StructureErrorKind::MissingAttribute,
            )
        })
    }

    pub fn optional_attribute(&self, name: &str) -> Option<String> {
        self.node.attribute(name).map(str::to_string)
    }

    /// An attribute that falls back to `default` when absent or empty.
    pub fn attribute_or(&self, name: &str, default: &str) -> String {
        match self.node.attribute(name) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => default.to_string(),
        }
    }

    /// Direct text of the element; the empty string when there is none.
    pub fn text(&self) -> &'a str {
        self.node.text().unwrap_or("")
    }

    /// A required singular child.
    pub fn child<T: FromElement>(&self, name: &str) -> SchemaResult<T> {
        self.optional_child(name)?.ok_or_else(|| {
            StructureError::new(self.child_path(name), StructureErrorKind::MissingElement)
        })
    }

    /// An optional singular child. Appearing more than once is an error.
    pub fn optional_child<T: FromElement>(&self, name: &str) -> SchemaResult<Option<T>> {
        match self.node.children(name) {
            [] => Ok(None),
            [only] => T::from_element(&Element::new(only, self.child_path(name))).map(Some),
            many => Err(StructureError::new(
                self.child_path(name),
                StructureErrorKind::Multiple(many.len()),
            )),
        }
    }

    /// One or more children.
    pub fn list<T: FromElement>(&self, name: &str) -> SchemaResult<Vec<T>> {
        list_element(self.node.children(name), &self.child_path(name))
    }

    /// Zero or more children; absent yields an empty `Vec`.
    pub fn optional_list<T: FromElement>(&self, name: &str) -> SchemaResult<Vec<T>> {
        if self.node.has_child(name) {
            self.list(name)
        } else {
            Ok(Vec::new())
        }
    }
}

// ============================================================================
// The four element shapes
// ============================================================================

/// An element carrying attributes and no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyElement<A = ()> {
    pub attributes: A,
}

/// An element whose text is validated by `T` (any string by default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextElement<T = String, A = ()> {
    pub value: T,
    pub attributes: A,
}

/// Validates an element with attribute constraints and no meaningful text.
///
/// # Errors
///
/// Fails if the element carries non-whitespace text or an attribute
/// constraint of `A` fails.
pub fn empty_element<A: FromAttributes>(el: &Element<'_>) -> SchemaResult<EmptyElement<A>> {
    if let Some(text) = el.node().text() {
        return Err(StructureError::new(
            el.path(),
            StructureErrorKind::UnexpectedText(text.to_string()),
        ));
    }
    Ok(EmptyElement {
        attributes: A::from_attributes(el)?,
    })
}

/// Validates an element's text with `T` and its attributes with `A`.
///
/// A missing text payload is validated as the empty string.
///
/// # Errors
///
/// Fails if the text is rejected by `T` or an attribute constraint fails.
pub fn text_element<T: TextSchema, A: FromAttributes>(
    el: &Element<'_>,
) -> SchemaResult<TextElement<T, A>> {
    let attributes = A::from_attributes(el)?;
    let value = T::parse_text(el.text()).map_err(|kind| StructureError::new(el.path(), kind))?;
    Ok(TextElement { value, attributes })
}

/// Validates an element as a record of named children.
///
/// # Errors
///
/// Propagates the first failing child of `T`.
pub fn node_element<T: FromElement>(el: &Element<'_>) -> SchemaResult<T> {
    T::from_element(el)
}

/// Validates one-or-many children and always yields a non-empty sequence.
///
/// `path` names the children; items are reported as `path[index]`.
///
/// # Errors
///
/// Fails with [`StructureErrorKind::EmptyList`] for zero children, or with
/// the first item that fails `T`.
pub fn list_element<T: FromElement>(nodes: &[Node], path: &str) -> SchemaResult<Vec<T>> {
    if nodes.is_empty() {
        return Err(StructureError::new(path, StructureErrorKind::EmptyList));
    }
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| T::from_element(&Element::new(node, format!("{}[{}]", path, i))))
        .collect()
}

impl<A: FromAttributes> FromElement for EmptyElement<A> {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        empty_element(el)
    }
}

impl<T: TextSchema, A: FromAttributes> FromElement for TextElement<T, A> {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        text_element(el)
    }
}

impl<T> TextElement<T, ()> {
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Any element shape, kept as-is (e.g. the `div` of an XHTML construct).
impl FromElement for Node {
    fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
        Ok(el.node().clone())
    }
}

impl FromAttributes for () {
    fn from_attributes(_: &Element<'_>) -> SchemaResult<Self> {
        Ok(())
    }
}

// ============================================================================
// Text schemas
// ============================================================================

impl TextSchema for String {
    fn parse_text(text: &str) -> Result<Self, StructureErrorKind> {
        Ok(text.to_string())
    }
}

/// An RFC 3339 date-time text, normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rfc3339Date(pub DateTime<Utc>);

/// An RFC 822 date-time text, normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rfc822Date(pub DateTime<Utc>);

impl TextSchema for Rfc3339Date {
    fn parse_text(text: &str) -> Result<Self, StructureErrorKind> {
        Ok(Self(date::rfc3339(text)?))
    }
}

impl TextSchema for Rfc822Date {
    fn parse_text(text: &str) -> Result<Self, StructureErrorKind> {
        Ok(Self(date::rfc822(text)?))
    }
}

/// Plain string element without attributes.
pub type Text = TextElement<String, ()>;
/// Date element in RFC 3339 form.
pub type Rfc3339Text = TextElement<Rfc3339Date, ()>;
/// Date element in RFC 822 form.
pub type Rfc822Text = TextElement<Rfc822Date, ()>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::error::DateParseError;

    #[derive(Debug, PartialEq)]
    struct Href {
        href: String,
        rel: String,
    }

    impl FromAttributes for Href {
        fn from_attributes(el: &Element<'_>) -> SchemaResult<Self> {
            Ok(Self {
                href: el.attribute("href")?,
                rel: el.attribute_or("rel", "alternate"),
            })
        }
    }

    #[derive(Debug, PartialEq)]
    struct Entry {
        id: String,
        updated: Option<Rfc3339Date>,
    }

    impl FromElement for Entry {
        fn from_element(el: &Element<'_>) -> SchemaResult<Self> {
            Ok(Self {
                id: el.child::<Text>("id")?.into_value(),
                updated: el
                    .optional_child::<Rfc3339Text>("updated")?
                    .map(TextElement::into_value),
            })
        }
    }

    fn text(value: &str) -> Node {
        Node::element().with_text(value)
    }

    #[test]
    fn test_list_single_and_many_have_same_shape() {
        let one = Node::element().with_child("id", text("a"));
        let single = Node::element().with_child("entry", one.clone());
        let many = Node::element()
            .with_child("entry", one.clone())
            .with_child("entry", one);

        let single: Vec<Entry> = Element::root(&single).list("entry").unwrap();
        let many: Vec<Entry> = Element::root(&many).list("entry").unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(many.len(), 2);
        assert_eq!(single[0], many[0]);
    }

    #[test]
    fn test_list_of_zero_fails() {
        let err = list_element::<Entry>(&[], "feed.entry").unwrap_err();
        assert_eq!(err.kind, StructureErrorKind::EmptyList);
        assert_eq!(err.path, "feed.entry");

        let parent = Node::element();
        let err = Element::new(&parent, "feed").list::<Entry>("entry").unwrap_err();
        assert_eq!(err.path, "feed.entry");
    }

    #[test]
    fn test_optional_list_absent_is_empty() {
        let parent = Node::element();
        let entries: Vec<Entry> = Element::root(&parent).optional_list("entry").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_list_item_error_carries_index() {
        let parent = Node::element()
            .with_child("entry", Node::element().with_child("id", text("a")))
            .with_child("entry", Node::element());
        let err = Element::new(&parent, "feed").list::<Entry>("entry").unwrap_err();
        assert_eq!(err.path, "feed.entry[1].id");
        assert_eq!(err.kind, StructureErrorKind::MissingElement);
    }

    #[test]
    fn test_unknown_children_ignored() {
        let node = Node::element()
            .with_child("id", text("a"))
            .with_child("media:thumbnail", Node::element().with_attribute("url", "x"));
        let entry: Entry = node_element(&Element::root(&node)).unwrap();
        assert_eq!(entry.id, "a");
    }

    #[test]
    fn test_singular_child_appearing_twice_fails() {
        let node = Node::element()
            .with_child("id", text("a"))
            .with_child("id", text("b"));
        let err = node_element::<Entry>(&Element::new(&node, "entry")).unwrap_err();
        assert_eq!(err.kind, StructureErrorKind::Multiple(2));
        assert_eq!(err.path, "entry.id");
    }

    #[test]
    fn test_empty_element_attributes_and_defaults() {
        let node = Node::element().with_attribute("href", "https://example.com/");
        let link: EmptyElement<Href> = empty_element(&Element::root(&node)).unwrap();
        assert_eq!(link.attributes.href, "https://example.com/");
        assert_eq!(link.attributes.rel, "alternate");
    }

    #[test]
    fn test_empty_element_missing_attribute() {
        let node = Node::element();
        let err = empty_element::<Href>(&Element::new(&node, "feed.link[0]")).unwrap_err();
        assert_eq!(err.path, "feed.link[0].@href");
        assert_eq!(err.kind, StructureErrorKind::MissingAttribute);
    }

    #[test]
    fn test_empty_element_rejects_text() {
        let node = Node::element()
            .with_attribute("href", "https://example.com/")
            .with_text("oops");
        let err = empty_element::<Href>(&Element::root(&node)).unwrap_err();
        assert_eq!(err.kind, StructureErrorKind::UnexpectedText("oops".into()));
    }

    #[test]
    fn test_empty_element_discards_whitespace() {
        let node = Node::element()
            .with_attribute("href", "https://example.com/")
            .with_text("  \n ");
        assert!(empty_element::<Href>(&Element::root(&node)).is_ok());
    }

    #[test]
    fn test_text_element_transforms_dates() {
        let node = text("2023-11-01T22:55:15.822Z");
        let updated: Rfc3339Text = text_element(&Element::root(&node)).unwrap();
        assert_eq!(
            updated.value.0,
            date::rfc3339("2023-11-01T22:55:15.822Z").unwrap()
        );
    }

    #[test]
    fn test_text_element_date_failure_is_structural() {
        let node = text("yesterday");
        let err = text_element::<Rfc822Date, ()>(&Element::new(&node, "rss.channel.pubDate"))
            .unwrap_err();
        assert_eq!(err.path, "rss.channel.pubDate");
        assert_eq!(
            err.kind,
            StructureErrorKind::Date(DateParseError::Rfc822("yesterday".into()))
        );
    }

    #[test]
    fn test_text_element_missing_text_is_empty_string() {
        let node = Node::element();
        let title: Text = text_element(&Element::root(&node)).unwrap();
        assert_eq!(title.value, "");
    }
}

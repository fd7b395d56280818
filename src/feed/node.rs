//! Generic parsed-node representation and the quick-xml tree builder.
//!
//! Every child name maps to a *sequence* of nodes, even when the element
//! appears once. This is where the one-or-many ambiguity of XML is settled,
//! so the schema combinators never branch on it.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::FeedError;

/// SEC-003: Maximum element nesting depth accepted from a feed document.
/// Real feeds rarely exceed 10; this rejects maliciously deep trees.
const MAX_XML_DEPTH: usize = 64;

/// One parsed element: attributes, named children and direct text.
///
/// Names are kept qualified exactly as written (`rdf:about`, `dc:date`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub attributes: BTreeMap<String, String>,
    pub children: BTreeMap<String, Vec<Node>>,
    /// Direct text and CDATA of this element, trimmed. `None` when empty.
    pub text: Option<String>,
    /// Text runs and children in document order, for flattening markup.
    sequence: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Child { name: String, index: usize },
}

impl Node {
    pub fn element() -> Self {
        Self::default()
    }

    /// Wraps a root element so its name is visible as a top-level child.
    pub fn document(root_name: &str, root: Node) -> Self {
        Self::default().with_child(root_name, root)
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.push_text(text);
        self.finish();
        self
    }

    pub fn with_child(mut self, name: &str, child: Node) -> Self {
        self.push_child(name.to_string(), child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Children with the given name; empty when there are none.
    pub fn children(&self, name: &str) -> &[Node] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text of this element and all its descendants, markup removed.
    ///
    /// Computed on demand by walking the element in document order; sibling
    /// elements are separated by a single space.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for segment in &self.sequence {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Child { name, index } => {
                    let Some(child) = self.children.get(name).and_then(|c| c.get(*index)) else {
                        continue;
                    };
                    let inner = child.text_content();
                    if inner.is_empty() {
                        continue;
                    }
                    if out.chars().last().is_some_and(|c| !c.is_whitespace()) {
                        out.push(' ');
                    }
                    out.push_str(&inner);
                }
            }
        }
        out.trim().to_string()
    }

    fn push_text(&mut self, text: &str) {
        self.text.get_or_insert_with(String::new).push_str(text);
        // Indentation between elements carries nothing for flattening
        if !text.trim().is_empty() {
            self.sequence.push(Segment::Text(text.to_string()));
        }
    }

    fn push_child(&mut self, name: String, child: Node) {
        let siblings = self.children.entry(name.clone()).or_default();
        self.sequence.push(Segment::Child {
            name,
            index: siblings.len(),
        });
        siblings.push(child);
    }

    fn finish(&mut self) {
        self.text = self
            .text
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }
}

/// Parses an XML document into a document node whose single child is the
/// root element.
///
/// # Errors
///
/// Returns [`FeedError::Xml`] if the markup is malformed, uses an entity
/// other than the five XML builtins, nests deeper than the safety limit,
/// or has no root element.
pub fn parse_xml(content: &str) -> Result<Node, FeedError> {
    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations; only the
    // five predefined entities resolve, anything else fails in `unescape()`.
    let mut reader = Reader::from_str(content);

    // Frame 0 is the document itself.
    let mut stack: Vec<(String, Node)> = vec![(String::new(), Node::default())];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if stack.len() > MAX_XML_DEPTH {
                    return Err(FeedError::Xml(format!(
                        "element nesting exceeds maximum of {} levels",
                        MAX_XML_DEPTH
                    )));
                }
                let name = element_name(&e)?;
                let node = element_with_attributes(&e, &reader)?;
                stack.push((name, node));
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(&e)?;
                let node = element_with_attributes(&e, &reader)?;
                close_into_parent(&mut stack, name, node);
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(FeedError::Xml("unexpected closing tag".into()));
                }
                if let Some((name, node)) = stack.pop() {
                    close_into_parent(&mut stack, name, node);
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| FeedError::Xml(e.to_string()))?;
                if let Some((_, top)) = stack.last_mut() {
                    top.push_text(&text);
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8(e.into_inner().into_owned())
                    .map_err(|e| FeedError::Xml(e.to_string()))?;
                if let Some((_, top)) = stack.last_mut() {
                    top.push_text(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        let open = stack.last().map(|(name, _)| name.as_str()).unwrap_or("");
        return Err(FeedError::Xml(format!("unclosed element '{}'", open)));
    }

    let Some((_, mut document)) = stack.pop() else {
        return Err(FeedError::Xml("empty document".into()));
    };
    if document.children.is_empty() {
        return Err(FeedError::Xml("document has no root element".into()));
    }
    document.finish();
    Ok(document)
}

fn close_into_parent(stack: &mut [(String, Node)], name: String, mut node: Node) {
    node.finish();
    if let Some((_, parent)) = stack.last_mut() {
        parent.push_child(name, node);
    }
}

fn element_name(e: &BytesStart<'_>) -> Result<String, FeedError> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|e| FeedError::Xml(e.to_string()))
}

fn element_with_attributes(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<Node, FeedError> {
    let mut node = Node::element();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| FeedError::Xml(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| FeedError::Xml(e.to_string()))?
            .to_string();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| FeedError::Xml(e.to_string()))?;
        node.attributes.insert(key, value.into_owned());
    }
    Ok(node)
}

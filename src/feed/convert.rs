//! Converters from the validated XML formats into the canonical JSON Feed.
//!
//! Each converter consumes its intermediate tree, maps fields, and
//! re-validates the result before handing it out: a converter bug must
//! surface as an error, never as an invalid canonical feed.

use super::atom::{self, AtomDocument, Content, TextConstruct, TextKind};
use super::error::{StructureError, StructureErrorKind};
use super::json_feed::{Attachment, Author, Item, JsonFeed};
use super::rss1::Rss1Document;
use super::rss2::{self, Rss2Document};
use super::schema::{EmptyElement, Text};

pub type ConvertResult = Result<JsonFeed, StructureError>;

// ============================================================================
// Atom
// ============================================================================

/// Converts a validated Atom document.
///
/// # Errors
///
/// Fails if an `enclosure` link lacks `@type`, has a non-numeric
/// `@length`, or the produced feed does not validate.
pub fn atom_to_json_feed(doc: AtomDocument) -> ConvertResult {
    let feed = doc.feed;

    let mut items = Vec::with_capacity(feed.entries.len());
    for (i, entry) in feed.entries.into_iter().enumerate() {
        let path = format!("feed.entry[{}]", i);
        let attachments = atom_attachments(&entry.links, &path)?;
        let mut item = Item {
            id: entry.id.value,
            url: html_link(&entry.links),
            title: non_empty(entry.title.text()),
            summary: entry.summary.as_ref().and_then(|s| non_empty(s.text())),
            date_published: entry.published.map(|d| d.value.0),
            date_modified: Some(entry.updated.value.0),
            authors: entry.authors.into_iter().map(atom_author).collect(),
            tags: entry
                .categories
                .into_iter()
                .map(|c| c.attributes.term)
                .collect(),
            attachments,
            ..Item::default()
        };
        match entry.content {
            Some(Content::Text(construct)) => match construct {
                TextConstruct::Plain {
                    kind: TextKind::Html,
                    text,
                } => item.content_html = non_empty(&text),
                other => item.content_text = non_empty(other.text()),
            },
            Some(Content::OutOfLine { src, .. }) => item.external_url = Some(src),
            Some(Content::Other) | None => {}
        }
        items.push(item);
    }

    let mut out = JsonFeed::new(feed.title.text());
    out.home_page_url = html_link(&feed.links);
    out.feed_url = feed
        .links
        .iter()
        .find(|l| l.attributes.rel == "self")
        .map(|l| l.attributes.href.clone());
    out.description = feed.subtitle.as_ref().and_then(|s| non_empty(s.text()));
    out.favicon = feed.icon.map(|t| t.value);
    out.icon = feed.logo.map(|t| t.value);
    out.language = feed.lang;
    out.authors = feed.authors.into_iter().map(atom_author).collect();
    out.items = items;

    out.validate()?;
    Ok(out)
}

/// Preferred human-readable link: an `alternate` of type `text/html`, then
/// any `alternate`, then the first link.
fn html_link(links: &[EmptyElement<atom::Link>]) -> Option<String> {
    let mut alternates = links.iter().filter(|l| l.attributes.rel == "alternate");
    let preferred = alternates
        .clone()
        .find(|l| l.attributes.mime_type.as_deref() == Some("text/html"));
    preferred
        .or_else(|| alternates.next())
        .or_else(|| links.first())
        .map(|l| l.attributes.href.clone())
}

fn atom_attachments(
    links: &[EmptyElement<atom::Link>],
    entry_path: &str,
) -> Result<Vec<Attachment>, StructureError> {
    links
        .iter()
        .enumerate()
        .filter(|(_, l)| l.attributes.rel == "enclosure")
        .map(|(j, l)| -> Result<Attachment, StructureError> {
            let path = format!("{}.link[{}]", entry_path, j);
            let link = &l.attributes;
            let mime_type = link.mime_type.clone().ok_or_else(|| {
                StructureError::new(
                    format!("{}.@type", path),
                    StructureErrorKind::MissingAttribute,
                )
            })?;
            Ok(Attachment {
                url: link.href.clone(),
                mime_type,
                title: link.title.clone(),
                size_in_bytes: parse_length(link.length.as_deref(), &format!("{}.@length", path))?,
                ..Attachment::default()
            })
        })
        .collect()
}

fn atom_author(person: atom::Person) -> Author {
    Author {
        name: non_empty(&person.name.value),
        url: person.uri.map(|u| u.value),
        ..Author::default()
    }
}

// ============================================================================
// RSS 1.0
// ============================================================================

/// Converts a validated RSS 1.0 document. Items are identified by their link.
///
/// # Errors
///
/// Fails if the produced feed does not validate (e.g. an empty item link).
pub fn rss1_to_json_feed(doc: Rss1Document) -> ConvertResult {
    let rdf = doc.rdf;
    let channel = rdf.channel;

    let items = rdf
        .items
        .into_iter()
        .map(|item| Item {
            id: item.link.value.clone(),
            url: non_empty(&item.link.value),
            title: non_empty(&item.title.value),
            summary: item.description.and_then(text_value),
            date_published: item.date.map(|d| d.value.0),
            authors: item
                .creator
                .and_then(text_value)
                .map(named_author)
                .into_iter()
                .collect(),
            tags: item.subjects.into_iter().filter_map(text_value).collect(),
            ..Item::default()
        })
        .collect();

    let mut out = JsonFeed::new(channel.title.value);
    out.home_page_url = text_value(channel.link);
    out.feed_url = non_empty(&channel.about);
    out.description = text_value(channel.description);
    out.icon = rdf.image.and_then(|image| text_value(image.url));
    out.language = channel.language.and_then(text_value);
    out.items = items;

    out.validate()?;
    Ok(out)
}

// ============================================================================
// RSS 2.0
// ============================================================================

/// Converts a validated RSS 2.0 document.
///
/// An item is identified by its `link`, falling back to its `guid`; a guid
/// doubles as the item URL unless marked `isPermaLink="false"`.
///
/// # Errors
///
/// Fails if an item has neither link nor guid, an enclosure `@length` is
/// not a number, or the produced feed does not validate.
pub fn rss2_to_json_feed(doc: Rss2Document) -> ConvertResult {
    let channel = doc.rss.channel;

    let mut items = Vec::with_capacity(channel.items.len());
    for (i, item) in channel.items.into_iter().enumerate() {
        let path = format!("rss.channel.item[{}]", i);
        let link = item.link.and_then(text_value);
        let guid = item.guid.and_then(|g| {
            let permalink = g.attributes.is_perma_link();
            non_empty(&g.value).map(|value| (value, permalink))
        });

        let (id, url) = match (link, guid) {
            (Some(link), _) => (link.clone(), Some(link)),
            (None, Some((guid, true))) => (guid.clone(), Some(guid)),
            (None, Some((guid, false))) => (guid, None),
            (None, None) => {
                return Err(StructureError::new(
                    format!("{}.link", path),
                    StructureErrorKind::InvalidValue("item has neither link nor guid".into()),
                ))
            }
        };

        let attachments = match item.enclosure {
            Some(enclosure) => vec![rss2_attachment(
                enclosure.attributes,
                &format!("{}.enclosure", path),
            )?],
            None => Vec::new(),
        };

        items.push(Item {
            id,
            url,
            title: item.title.and_then(text_value),
            content_html: item.description.and_then(text_value),
            date_published: item.pub_date.map(|d| d.value.0),
            authors: item
                .author
                .and_then(text_value)
                .map(named_author)
                .into_iter()
                .collect(),
            tags: item
                .categories
                .into_iter()
                .filter_map(|c| non_empty(&c.value))
                .collect(),
            attachments,
            ..Item::default()
        });
    }

    let mut out = JsonFeed::new(channel.title.value);
    out.home_page_url = text_value(channel.link);
    out.description = text_value(channel.description);
    out.language = channel.language.and_then(text_value);
    out.icon = channel.image.and_then(|image| text_value(image.url));
    out.items = items;

    out.validate()?;
    Ok(out)
}

fn rss2_attachment(enclosure: rss2::Enclosure, path: &str) -> Result<Attachment, StructureError> {
    Ok(Attachment {
        size_in_bytes: parse_length(Some(enclosure.length.as_str()), &format!("{}.@length", path))?,
        url: enclosure.url,
        mime_type: enclosure.mime_type,
        ..Attachment::default()
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Byte length of an enclosure: blank means unknown, anything but a
/// non-negative number fails.
fn parse_length(length: Option<&str>, path: &str) -> Result<Option<f64>, StructureError> {
    match length.map(str::trim) {
        None | Some("") => Ok(None),
        Some(number) => match number.parse::<f64>() {
            Ok(bytes) if bytes.is_finite() && bytes >= 0.0 => Ok(Some(bytes)),
            _ => Err(StructureError::invalid(
                path,
                format!("length must be a byte count, found {:?}", number),
            )),
        },
    }
}

fn named_author(name: String) -> Author {
    Author {
        name: Some(name),
        ..Author::default()
    }
}

fn text_value(text: Text) -> Option<String> {
    Some(text.value).filter(|v| !v.is_empty())
}

fn non_empty(text: &str) -> Option<String> {
    Some(text).filter(|t| !t.is_empty()).map(str::to_string)
}

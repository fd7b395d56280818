//! Feed normalization: Atom, RSS 1.0, RSS 2.0 and JSON Feed into one model.
//!
//! The pipeline for one document:
//!
//! - [`node`] - XML text into a generic tree where every child name maps
//!   to a sequence of nodes
//! - [`schema`] - combinators validating such trees into typed records
//! - [`date`] - RFC 822 / RFC 3339 date-times into UTC instants
//! - [`atom`], [`rss1`], [`rss2`], [`json_feed`] - one schema per format
//! - [`convert`] - each XML format into the canonical [`JsonFeed`]
//! - [`parser`] - format detection and dispatch
//!
//! [`fetcher`] retrieves documents over HTTP and runs them through the
//! pipeline.
//!
//! # Example
//!
//! ```
//! use feedmill::feed::parse_bytes;
//!
//! let rss = br#"<rss version="2.0"><channel>
//!   <title>Example</title><link>https://example.com/</link><description/>
//!   <item><link>https://example.com/1</link><pubDate>Sat, 02 Mar 2024 10:00:00 +0100</pubDate></item>
//! </channel></rss>"#;
//!
//! let feed = parse_bytes(rss, Some("application/rss+xml")).unwrap();
//! assert_eq!(feed.items[0].id, "https://example.com/1");
//! ```

pub mod atom;
pub mod convert;
pub mod date;
pub mod error;
pub mod fetcher;
pub mod json_feed;
pub mod node;
pub mod parser;
pub mod rss1;
pub mod rss2;
pub mod schema;

pub use error::{DateParseError, FeedError, StructureError, StructureErrorKind};
pub use fetcher::{fetch, fetch_all, FetchError, FetchResult, Fetched};
pub use json_feed::{Attachment, Author, Hub, Item, JsonFeed};
pub use node::{parse_xml, Node};
pub use parser::{detect, parse_bytes, parse_document, Document, Format};

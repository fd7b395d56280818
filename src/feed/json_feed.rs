//! JSON Feed 1.1: the canonical feed model every format converges on.
//!
//! The same types serve as the input schema for `application/feed+json`
//! documents and as the output of the XML converters. Serde handles the
//! shape; [`JsonFeed::validate`] checks what the types cannot express.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::{FeedError, StructureError, StructureErrorKind};

pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFeed {
    #[serde(default = "default_version")]
    pub version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hubs: Vec<Hub>,
    pub items: Vec<Item>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
    #[serde(default, with = "instant", skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
    #[serde(default, with = "instant", skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    #[serde(rename = "type")]
    pub hub_type: String,
    pub url: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_in_bytes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_seconds: Option<f64>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Custom `_`-prefixed properties, carried through unvalidated.
///
/// Any other unrecognized property is dropped while deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Extensions(pub BTreeMap<String, Value>);

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut all = BTreeMap::<String, Value>::deserialize(deserializer)?;
        all.retain(|key, _| key.starts_with('_'));
        Ok(Self(all))
    }
}

impl Extensions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

fn default_version() -> String {
    JSON_FEED_VERSION.to_string()
}

/// Item dates: RFC 3339 text in, UTC millisecond text out.
mod instant {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::feed::date;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(instant) => {
                serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| date::rfc3339(t.as_str()).map_err(de::Error::custom))
            .transpose()
    }
}

impl JsonFeed {
    /// A feed with the given title, no items and the default version.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            title: title.into(),
            home_page_url: None,
            feed_url: None,
            description: None,
            user_comment: None,
            next_url: None,
            icon: None,
            favicon: None,
            authors: Vec::new(),
            language: None,
            expired: None,
            hubs: Vec::new(),
            items: Vec::new(),
            extensions: Extensions::default(),
        }
    }

    /// Deserializes and validates a JSON Feed from an already-parsed value.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Json`] when the value does not have the JSON Feed
    /// shape (including a malformed date), or [`FeedError::Structure`] when a
    /// constraint of [`validate`](Self::validate) fails.
    pub fn from_value(value: Value) -> Result<Self, FeedError> {
        let feed: JsonFeed = serde_json::from_value(value)?;
        feed.validate()?;
        Ok(feed)
    }

    /// Parses and validates JSON Feed bytes.
    ///
    /// # Errors
    ///
    /// Same as [`from_value`](Self::from_value), plus syntax errors.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FeedError> {
        let feed: JsonFeed = serde_json::from_slice(bytes)?;
        feed.validate()?;
        Ok(feed)
    }

    /// Checks the constraints serde's typing leaves open.
    ///
    /// # Errors
    ///
    /// Returns the first violation with its path, e.g. `items[2].id`.
    pub fn validate(&self) -> Result<(), StructureError> {
        for (i, item) in self.items.iter().enumerate() {
            let path = format!("items[{}]", i);
            if item.id.trim().is_empty() {
                return Err(StructureError::new(
                    format!("{}.id", path),
                    StructureErrorKind::MissingElement,
                ));
            }
            for (j, attachment) in item.attachments.iter().enumerate() {
                attachment.validate(&format!("{}.attachments[{}]", path, j))?;
            }
        }
        for (i, hub) in self.hubs.iter().enumerate() {
            if hub.url.is_empty() {
                return Err(StructureError::new(
                    format!("hubs[{}].url", i),
                    StructureErrorKind::MissingElement,
                ));
            }
        }
        Ok(())
    }
}

impl Attachment {
    fn validate(&self, path: &str) -> Result<(), StructureError> {
        if self.url.is_empty() {
            return Err(StructureError::new(
                format!("{}.url", path),
                StructureErrorKind::MissingElement,
            ));
        }
        if self.mime_type.is_empty() {
            return Err(StructureError::new(
                format!("{}.mime_type", path),
                StructureErrorKind::MissingElement,
            ));
        }
        if let Some(size) = self.size_in_bytes {
            if !size.is_finite() || size < 0.0 {
                return Err(StructureError::invalid(
                    format!("{}.size_in_bytes", path),
                    format!("size must be a non-negative number, found {}", size),
                ));
            }
        }
        if let Some(duration) = self.duration_in_seconds {
            if !duration.is_finite() || duration < 0.0 {
                return Err(StructureError::invalid(
                    format!("{}.duration_in_seconds", path),
                    format!("duration must be a non-negative number, found {}", duration),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::date;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "version": "https://jsonfeed.org/version/1.1",
            "title": "My Example Feed",
            "home_page_url": "https://example.org/",
            "feed_url": "https://example.org/feed.json",
            "authors": [{ "name": "Brent Simmons", "_mastodon": "@brent" }],
            "_blue_shed": { "about": "https://blueshed-podcasts.com/json-feed-extension-docs" },
            "items": [
                {
                    "id": "2",
                    "content_text": "This is a second item.",
                    "url": "https://example.org/second-item",
                    "date_published": "2010-02-07T14:04:00-05:00"
                },
                {
                    "id": "1",
                    "content_html": "<p>Hello, world!</p>",
                    "url": "https://example.org/initial-post",
                    "attachments": [{
                        "url": "https://example.org/episode.m4a",
                        "mime_type": "audio/x-m4a",
                        "size_in_bytes": 89970236,
                        "duration_in_seconds": 6629
                    }]
                }
            ]
        })
    }

    #[test]
    fn test_sample_validates() {
        let feed = JsonFeed::from_value(sample()).unwrap();
        assert_eq!(feed.title, "My Example Feed");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(
            feed.items[0].date_published,
            Some(date::rfc3339("2010-02-07T19:04:00Z").unwrap())
        );
        let attachment = &feed.items[1].attachments[0];
        assert_eq!(attachment.size_in_bytes, Some(89_970_236.0));
        assert_eq!(attachment.duration_in_seconds, Some(6629.0));
    }

    #[test]
    fn test_version_defaults() {
        let feed = JsonFeed::from_value(json!({ "title": "t", "items": [] })).unwrap();
        assert_eq!(feed.version, JSON_FEED_VERSION);
    }

    #[test]
    fn test_underscore_extensions_pass_through_and_others_drop() {
        let mut value = sample();
        value["unknown_key"] = json!("dropped");
        value["items"][0]["_custom"] = json!({ "nested": [1, 2, 3] });
        value["items"][0]["also_unknown"] = json!(true);

        let feed = JsonFeed::from_value(value).unwrap();
        assert!(feed.extensions.get("_blue_shed").is_some());
        assert!(feed.extensions.get("unknown_key").is_none());
        assert_eq!(
            feed.items[0].extensions.get("_custom"),
            Some(&json!({ "nested": [1, 2, 3] }))
        );
        assert_eq!(feed.items[0].extensions.0.len(), 1);
        assert_eq!(
            feed.authors[0].extensions.get("_mastodon"),
            Some(&json!("@brent"))
        );

        let out = serde_json::to_value(&feed).unwrap();
        assert!(out.get("unknown_key").is_none());
        assert_eq!(out["_blue_shed"], sample()["_blue_shed"]);
    }

    #[test]
    fn test_validation_is_a_fixed_point() {
        let once = JsonFeed::from_value(sample()).unwrap();
        let twice = JsonFeed::from_value(serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dates_serialize_as_utc_millis() {
        let feed = JsonFeed::from_value(sample()).unwrap();
        let out = serde_json::to_value(&feed).unwrap();
        assert_eq!(out["items"][0]["date_published"], json!("2010-02-07T19:04:00.000Z"));
        assert!(out["items"][1].get("date_published").is_none());
    }

    #[test]
    fn test_missing_title_rejected() {
        let err = JsonFeed::from_value(json!({ "items": [] })).unwrap_err();
        assert!(matches!(err, FeedError::Json(_)));
    }

    #[test]
    fn test_missing_items_rejected() {
        let err = JsonFeed::from_value(json!({ "title": "t" })).unwrap_err();
        assert!(matches!(err, FeedError::Json(_)));
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut value = sample();
        value["items"][0]["date_published"] = json!("Sun, 07 Feb 2010 14:04:00 EST");
        let err = JsonFeed::from_value(value).unwrap_err();
        assert!(err.to_string().contains("RFC 3339"), "{}", err);
    }

    #[test]
    fn test_empty_item_id_rejected() {
        let mut value = sample();
        value["items"][1]["id"] = json!("");
        match JsonFeed::from_value(value).unwrap_err() {
            FeedError::Structure(err) => assert_eq!(err.path, "items[1].id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_attachment_constraints() {
        let mut value = sample();
        value["items"][1]["attachments"][0]["mime_type"] = json!("");
        match JsonFeed::from_value(value).unwrap_err() {
            FeedError::Structure(err) => {
                assert_eq!(err.path, "items[1].attachments[0].mime_type")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut value = sample();
        value["items"][1]["attachments"][0]["duration_in_seconds"] = json!(-1.5);
        assert!(JsonFeed::from_value(value).is_err());

        let mut value = sample();
        value["items"][1]["attachments"][0]["size_in_bytes"] = json!(-10);
        match JsonFeed::from_value(value).unwrap_err() {
            FeedError::Structure(err) => {
                assert_eq!(err.path, "items[1].attachments[0].size_in_bytes")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fractional_attachment_size_accepted() {
        let feed = JsonFeed::from_slice(
            br#"{"title":"j","items":[{"id":"1","attachments":[{"url":"u","mime_type":"m","size_in_bytes":1.5}]}]}"#,
        )
        .unwrap();
        assert_eq!(feed.items[0].attachments[0].size_in_bytes, Some(1.5));

        let whole = JsonFeed::from_value(json!({
            "title": "j",
            "items": [{ "id": "1", "attachments": [{ "url": "u", "mime_type": "m", "size_in_bytes": 1.0 }] }]
        }))
        .unwrap();
        assert_eq!(whole.items[0].attachments[0].size_in_bytes, Some(1.0));
    }

    #[test]
    fn test_from_slice() {
        let bytes = serde_json::to_vec(&sample()).unwrap();
        assert_eq!(
            JsonFeed::from_slice(&bytes).unwrap(),
            JsonFeed::from_value(sample()).unwrap()
        );
        assert!(matches!(
            JsonFeed::from_slice(b"{not json").unwrap_err(),
            FeedError::Json(_)
        ));
    }
}

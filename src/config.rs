//! Configuration file parser for ~/.config/feedmill/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A feed resource is not an absolute http(s) URL.
    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where to write the rendered article list. `None` = stdout.
    pub output: Option<PathBuf>,

    /// Maximum number of articles in the rendered list.
    pub max_items: usize,

    /// Maximum number of feeds fetched simultaneously.
    pub concurrency: usize,

    /// Feeds to fetch, in display order.
    pub feeds: Vec<FeedSource>,
}

/// One feed to fetch.
///
/// In TOML either a bare URL string or a table:
///
/// ```toml
/// feeds = [
///     "https://example.com/atom.xml",
///     { resource = "https://example.com/feed", content_type = "application/feed+json" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawFeedSource")]
pub struct FeedSource {
    pub resource: String,
    /// Overrides the `Content-Type` the server declares.
    pub content_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFeedSource {
    Url(String),
    Table {
        resource: String,
        #[serde(default)]
        content_type: Option<String>,
    },
}

impl From<RawFeedSource> for FeedSource {
    fn from(raw: RawFeedSource) -> Self {
        match raw {
            RawFeedSource::Url(resource) => Self::new(resource),
            RawFeedSource::Table {
                resource,
                content_type,
            } => Self {
                resource,
                content_type,
            },
        }
    }
}

impl FeedSource {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            content_type: None,
        }
    }

    /// SEC-001: Only absolute http(s) URLs are fetched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.resource.clone(),
            reason,
        };
        let url = url::Url::parse(&self.resource).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: None,
            max_items: 200,
            concurrency: 10,
            feeds: Vec::new(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Invalid feed URL → `Err(ConfigError::InvalidUrl)`
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["output", "max_items", "concurrency", "feeds"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        for feed in &config.feeds {
            feed.validate()?;
        }
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

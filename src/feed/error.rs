use thiserror::Error;

/// Errors produced while turning a date-time string into an instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// The input does not follow the RFC 822 date-time grammar.
    #[error("not an RFC 822 date-time: {0:?}")]
    Rfc822(String),
    /// The input does not follow the RFC 3339 date-time grammar.
    #[error("not an RFC 3339 date-time: {0:?}")]
    Rfc3339(String),
    /// The grammar matched but a component is not a valid calendar value
    /// (e.g. day 31 of February, hour 25, offset minute 75).
    #[error("date-time component out of range in {0:?}")]
    OutOfRange(String),
}

/// What went wrong at a given path of a validated tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureErrorKind {
    #[error("required element is missing")]
    MissingElement,
    #[error("required attribute is missing")]
    MissingAttribute,
    #[error("element must not contain text, found {0:?}")]
    UnexpectedText(String),
    #[error("element may appear only once, found {0}")]
    Multiple(usize),
    #[error("list must contain at least one element")]
    EmptyList,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    Date(#[from] DateParseError),
}

/// A structural validation failure, qualified with the path of the
/// offending element or attribute (e.g. `feed.entry[2].link[0].@href`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind}")]
pub struct StructureError {
    pub path: String,
    pub kind: StructureErrorKind,
}

impl StructureError {
    pub fn new(path: impl Into<String>, kind: StructureErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, StructureErrorKind::InvalidValue(message.into()))
    }
}

/// Errors surfaced by the normalization pipeline for a single document.
///
/// There is no partial result: any of these aborts the whole document.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A required element/attribute is missing or fails its constraint.
    #[error("invalid feed structure at {0}")]
    Structure(StructureError),

    /// A date element matched neither grammar or had an invalid component.
    #[error("invalid date at {path}: {source}")]
    Date {
        path: String,
        #[source]
        source: DateParseError,
    },

    /// The document's top-level shape matches none of the known formats.
    #[error("unknown feed format: {0}")]
    UnknownFormat(String),

    /// The XML text could not be parsed into a tree.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The JSON text could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StructureError> for FeedError {
    fn from(err: StructureError) -> Self {
        match err.kind {
            StructureErrorKind::Date(source) => FeedError::Date {
                path: err.path,
                source,
            },
            kind => FeedError::Structure(StructureError {
                path: err.path,
                kind,
            }),
        }
    }
}

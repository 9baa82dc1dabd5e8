use std::fmt;

use thiserror::Error;
use wsdl_docs_util::xml;

use crate::types::Direction;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file")]
    FileOpenError(std::io::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Malformed WSDL document")]
    Document(#[from] xml::Error),

    #[error("Unable to access operation store")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error in operation store")]
    Io(#[from] std::io::Error),

    #[error("Unable to (de)serialize operation store")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}

/// Why a single feed entry was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("missing `{{` in struct descriptor")]
    MissingBrace,

    #[error("missing space between type and name in `{0}`")]
    MissingSpace(String),

    #[error("missing `(` in function signature")]
    MissingParenthesis,

    #[error("missing return type in function signature")]
    MissingReturnType,
}

/// A link in the operation → message → element → type chain that led nowhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// The operation has no `input`/`output` child for the direction.
    Direction,
    Message(String),
    Element(String),
    Type(String),
}

/// Non-fatal problems found while building the catalog or resolving operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    MalformedFeedEntry {
        entry: String,
        error: FeedError,
    },
    MissingReference {
        operation: String,
        direction: Direction,
        reference: Reference,
    },
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direction => f.write_str("message reference"),
            Self::Message(name) => write!(f, "message {}", name),
            Self::Element(name) => write!(f, "element {}", name),
            Self::Type(name) => write!(f, "type {}", name),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedFeedEntry { entry, error } => {
                write!(f, "skipped feed entry {:?}: {}", entry, error)
            }

            Self::MissingReference {
                operation,
                direction,
                reference,
            } => write!(
                f,
                "{} of operation {} has unresolved {}",
                direction, operation, reference
            ),
        }
    }
}

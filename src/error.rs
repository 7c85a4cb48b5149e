//! Error types for vintagedb

use chrono::{DateTime, Utc};
use std::fmt;

/// Result type alias for vintagedb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vintagedb
///
/// The taxonomy is deliberately small: every failure is a deterministic
/// function of the request and the current store state, so nothing here is
/// retryable.
#[derive(Debug)]
pub enum Error {
    /// Unknown series name, browse reference, or a search with zero matches
    NotFound(String),
    /// Replace attempted without an expected timestamp on an existing series
    AlreadyExists(String),
    /// Optimistic-concurrency violation: the caller's timestamp is stale
    LastModifiedMismatch {
        expected: DateTime<Utc>,
        actual: DateTime<Utc>,
    },
    /// Revision-tracked series are read-only through the edit path
    RevisionReadOnly(String),
    /// Candidate record carries no primary name
    MissingPrimaryName,
    /// Structural invariant violated (length mismatches etc.)
    InvalidRecord(String),
    /// Configuration errors
    Config(String),
    /// Serialization errors at the adapter boundary
    Serialization(String),
    /// IO errors
    Io(std::io::Error),
}

impl Error {
    /// True for the two optimistic-concurrency conflict shapes.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::AlreadyExists(_) | Error::LastModifiedMismatch { .. }
        )
    }

    /// True for structurally disallowed requests.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Error::RevisionReadOnly(_) | Error::MissingPrimaryName | Error::InvalidRecord(_)
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(what) => write!(f, "Not found: {}", what),
            Error::AlreadyExists(name) => {
                write!(f, "Series already exists: {}", name)
            }
            Error::LastModifiedMismatch { expected, actual } => {
                write!(
                    f,
                    "Last-modified mismatch: caller saw {}, store has {}",
                    expected, actual
                )
            }
            Error::RevisionReadOnly(name) => {
                write!(f, "Series is revision-tracked and read-only: {}", name)
            }
            Error::MissingPrimaryName => write!(f, "Record is missing its primary name"),
            Error::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the sync pipeline and the query service.
///
/// Every failure is returned to the caller; nothing in the library
/// terminates the process.
#[derive(Debug, Error)]
pub enum Error {
    /// The aggregation endpoint could not be reached.
    #[error("Request to aggregation endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Aggregation endpoint returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Malformed JSON from the live API or the cache file.
    #[error("Failed to decode {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The blocking database task panicked or the connection lock was poisoned.
    #[error("Storage task failed: {0}")]
    StorageTask(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Multiple accounts named '{name}'. Use an ID instead: {ids:?}")]
    AmbiguousName { name: String, ids: Vec<String> },

    #[error("Invalid setup token: {0}")]
    InvalidSetupToken(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn decode(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            origin: origin.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors worth retrying against the aggregation endpoint.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Error::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// True when a lookup simply found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

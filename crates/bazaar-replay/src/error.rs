//! Error types for dense-log export and import.

use std::fmt;
use std::io;

/// Errors from reading or writing a dense log.
#[derive(Debug)]
pub enum ReplayError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The JSON document could not be encoded or decoded.
    Json {
        /// Parser or encoder message.
        detail: String,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json { detail } => write!(f, "dense log JSON error: {detail}"),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json { .. } => None,
        }
    }
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Self::Io(io::Error::other(e.to_string()))
        } else {
            Self::Json {
                detail: e.to_string(),
            }
        }
    }
}

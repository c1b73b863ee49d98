//! Error types for remote entry store operations.

use std::io;
use thiserror::Error;

/// Result type for remote entry store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors reported by a remote entry store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The store could not be reached or failed to answer.
    #[error("remote store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// A conditional write found a different stored version.
    #[error("version conflict: expected {expected}, stored {actual}")]
    VersionConflict {
        /// Version the writer expected.
        expected: u64,
        /// Version currently stored (0 when absent).
        actual: u64,
    },

    /// A listing cursor could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// Persisted store contents could not be decoded.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RemoteError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns true if this is a version conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::VersionConflict { .. })
    }

    /// Returns true if the failure is transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Unavailable { .. } | RemoteError::Io(_))
    }
}

//! Error types for datastore operations.

use thiserror::Error;
use verstore_remote::RemoteError;

/// Result type for datastore operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in datastore operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entry required by the caller does not exist.
    ///
    /// Store reads report absence as `None`; this variant is for callers
    /// that need presence.
    #[error("key {key:?} not found in store {store}")]
    NotFound {
        /// Store the key was looked up in.
        store: String,
        /// The missing key.
        key: String,
    },

    /// `update` kept hitting version conflicts.
    #[error("update of key {key:?} gave up after {attempts} conflicting attempts")]
    ConcurrencyExhausted {
        /// Key being updated.
        key: String,
        /// Attempts made, including the first.
        attempts: u32,
    },

    /// A value had the wrong type for the operation.
    #[error("invalid value for key {key:?}: {message}")]
    InvalidValueType {
        /// Key the value belongs to.
        key: String,
        /// Description of the mismatch.
        message: String,
    },

    /// The remote store could not be reached.
    #[error("remote store unavailable: {message}")]
    RemoteUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// The operation is part of the unsupported version-history family.
    #[error("{operation} is not implemented: version history is not retained")]
    NotImplemented {
        /// Upstream name of the operation.
        operation: &'static str,
    },

    /// The operation is not permitted in the current state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the misuse.
        message: String,
    },

    /// An argument was rejected before reaching the remote store.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// Any other remote store failure.
    #[error("remote store error: {0}")]
    Remote(#[source] RemoteError),
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(store: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            store: store.into(),
            key: key.into(),
        }
    }

    /// Creates an invalid value type error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValueType {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::RemoteUnavailable { .. } | CoreError::ConcurrencyExhausted { .. }
        )
    }
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unavailable { message } => CoreError::RemoteUnavailable { message },
            RemoteError::Io(e) => CoreError::RemoteUnavailable {
                message: e.to_string(),
            },
            RemoteError::InvalidCursor(message) => CoreError::InvalidArgument {
                message: format!("invalid cursor: {message}"),
            },
            other => CoreError::Remote(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_map_to_taxonomy() {
        let err: CoreError = RemoteError::unavailable("connection reset").into();
        assert!(matches!(err, CoreError::RemoteUnavailable { .. }));
        assert!(err.is_retryable());

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: CoreError = RemoteError::Io(io).into();
        assert!(matches!(err, CoreError::RemoteUnavailable { .. }));

        let err: CoreError = RemoteError::InvalidCursor("garbage".into()).into();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));

        let err: CoreError = RemoteError::Corrupted("bad file".into()).into();
        assert!(matches!(err, CoreError::Remote(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn error_display() {
        let err = CoreError::NotImplemented {
            operation: "GetVersionAsync",
        };
        assert_eq!(
            err.to_string(),
            "GetVersionAsync is not implemented: version history is not retained"
        );

        let err = CoreError::ConcurrencyExhausted {
            key: "gold".into(),
            attempts: 7,
        };
        assert!(err.to_string().contains("7"));
        assert!(err.to_string().contains("gold"));
    }
}

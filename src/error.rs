//! Error types for singleop
//!
//! Every failure a caller can observe is one of six kinds. Connectivity
//! failures (`Connection`, `Timeout`) are kept apart from semantic outcomes
//! reported by the store (`NotFound`, `Abort`, `KeyChanged`, `Unknown`).

use thiserror::Error;

use crate::value::Value;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for single-operation transactions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // Connectivity Errors
    // -------------------------------------------------------------------------
    /// Channel unusable: never opened, already closed, or reset
    #[error("Connection error: {0}")]
    Connection(String),

    /// No response within the configured bound; the server-side outcome is unknown
    #[error("Timeout: {0}")]
    Timeout(String),

    // -------------------------------------------------------------------------
    // Semantic Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    /// The store rejected or aborted the operation
    #[error("Operation aborted: {0}")]
    Abort(String),

    /// Test-and-set precondition failed; carries the value currently stored
    #[error("Key changed: current value is {old_value}")]
    KeyChanged { old_value: Value },

    /// Anything not classifiable above (malformed response, unexpected status)
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Fieldless view of [`ClientError`], handy for matching and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Timeout,
    NotFound,
    Abort,
    KeyChanged,
    Unknown,
}

impl ClientError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Connection(_) => ErrorKind::Connection,
            ClientError::Timeout(_) => ErrorKind::Timeout,
            ClientError::NotFound => ErrorKind::NotFound,
            ClientError::Abort(_) => ErrorKind::Abort,
            ClientError::KeyChanged { .. } => ErrorKind::KeyChanged,
            ClientError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Whether re-issuing the call is a sensible caller decision.
    ///
    /// The client itself never retries; an abort carries no data loss and a
    /// key change hands back the value to retry against.
    pub fn is_retryable_by_caller(&self) -> bool {
        matches!(self, ClientError::Abort(_) | ClientError::KeyChanged { .. })
    }

    /// Whether this is a connectivity failure rather than a store outcome
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connection(_) | ClientError::Timeout(_))
    }
}

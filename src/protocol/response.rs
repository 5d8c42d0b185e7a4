//! Response definitions
//!
//! Wire-level responses sent by a node and the decoded outcome a client
//! works with.

use crate::value::Value;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Abort = 0x02,
    KeyChanged = 0x03,
    Unknown = 0x04,
}

impl Status {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::NotFound),
            0x02 => Some(Status::Abort),
            0x03 => Some(Status::KeyChanged),
            0x04 => Some(Status::Unknown),
            _ => None,
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload: value bytes for OK/KEY_CHANGED, a reason for ABORT/UNKNOWN
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional value bytes
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// Create an ABORT response
    pub fn abort(reason: &str) -> Self {
        Self {
            status: Status::Abort,
            payload: Some(reason.as_bytes().to_vec()),
        }
    }

    /// Create a KEY_CHANGED response carrying the currently stored value
    pub fn key_changed(old_value: Vec<u8>) -> Self {
        Self {
            status: Status::KeyChanged,
            payload: Some(old_value),
        }
    }

    /// Create an UNKNOWN response
    pub fn unknown(reason: &str) -> Self {
        Self {
            status: Status::Unknown,
            payload: Some(reason.as_bytes().to_vec()),
        }
    }
}

/// Decoded outcome of one operation
///
/// Produced per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Success carrying a value (read)
    Value(Value),

    /// Success without payload (write, test-and-set)
    Done,

    NotFound,

    /// Store-side abort with its reason
    Aborted(String),

    /// Test-and-set mismatch with the value currently stored
    KeyChanged(Value),

    /// Malformed or unclassifiable response
    Unknown(String),
}

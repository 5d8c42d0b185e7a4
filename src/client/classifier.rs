//! Error classification
//!
//! Turns transport failures and decoded outcomes into the error taxonomy.
//! Each operation has its own total mapping: every outcome is either the
//! success that operation expects or exactly one error kind.

use std::io;

use crate::error::{ClientError, Result};
use crate::protocol::OperationResult;
use crate::value::Value;

/// Maps outcomes and transport faults to `ClientError`
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a transport-level failure on the channel to `node`
    pub fn transport(err: &io::Error, node: &str) -> ClientError {
        match err.kind() {
            // Unix reports an expired read timeout as WouldBlock
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                ClientError::Timeout(format!("no response from {} within the configured bound", node))
            }
            io::ErrorKind::InvalidData => {
                ClientError::Unknown(format!("unreadable frame from {}: {}", node, err))
            }
            io::ErrorKind::UnexpectedEof => {
                ClientError::Connection(format!("{} closed the connection", node))
            }
            _ => ClientError::Connection(format!("{}: {}", node, err)),
        }
    }

    /// The error for any operation attempted on a closed connection
    pub fn closed() -> ClientError {
        ClientError::Connection("connection is closed".to_string())
    }

    /// Outcome of a read: a value, or why there is none
    pub fn read(result: OperationResult) -> Result<Value> {
        match result {
            OperationResult::Value(value) => Ok(value),
            OperationResult::Done => Err(ClientError::Unknown("read answered OK without a value".to_string())),
            OperationResult::NotFound => Err(ClientError::NotFound),
            OperationResult::Aborted(reason) => Err(ClientError::Abort(reason)),
            OperationResult::KeyChanged(_) => {
                Err(ClientError::Unknown("read answered KEY_CHANGED".to_string()))
            }
            OperationResult::Unknown(reason) => Err(ClientError::Unknown(reason)),
        }
    }

    /// Outcome of a write
    pub fn write(result: OperationResult) -> Result<()> {
        match result {
            OperationResult::Done => Ok(()),
            OperationResult::Value(_) => {
                Err(ClientError::Unknown("write answered OK with an unexpected value".to_string()))
            }
            OperationResult::NotFound => Err(ClientError::Unknown("write answered NOT_FOUND".to_string())),
            OperationResult::Aborted(reason) => Err(ClientError::Abort(reason)),
            OperationResult::KeyChanged(_) => {
                Err(ClientError::Unknown("write answered KEY_CHANGED".to_string()))
            }
            OperationResult::Unknown(reason) => Err(ClientError::Unknown(reason)),
        }
    }

    /// Outcome of a test-and-set
    pub fn test_and_set(result: OperationResult) -> Result<()> {
        match result {
            OperationResult::Done => Ok(()),
            OperationResult::Value(_) => Err(ClientError::Unknown(
                "test-and-set answered OK with an unexpected value".to_string(),
            )),
            OperationResult::NotFound => Err(ClientError::NotFound),
            OperationResult::Aborted(reason) => Err(ClientError::Abort(reason)),
            OperationResult::KeyChanged(old_value) => Err(ClientError::KeyChanged { old_value }),
            OperationResult::Unknown(reason) => Err(ClientError::Unknown(reason)),
        }
    }
}

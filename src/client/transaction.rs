//! Single-operation transactions
//!
//! `TransactionSingleOp` runs each call as its own atomic transaction on
//! the store: one request, one response, no client-side retry of semantic
//! outcomes.
//!
//! ## Lifecycle
//! ```text
//!   connect ──► Active ──(close_connection / transport fault)──► Closed
//!                 │ ▲
//!                 └─┘ read / write / test_and_set
//! ```
//! Every operation on a Closed instance fails with a connection error
//! before any network access.

use super::ErrorClassifier;
use crate::config::ConnectionPolicy;
use crate::error::Result;
use crate::network::{create_connection, Connection, ConnectionManager};
use crate::protocol::{OperationCodec, OperationResult};
use crate::value::{Key, Value};

/// Client for single-key atomic operations
///
/// Owns its connection exclusively. Not for concurrent use: one instance
/// per thread, or external locking. Independent instances share nothing.
#[derive(Debug)]
pub struct TransactionSingleOp {
    connection: Connection,
}

impl TransactionSingleOp {
    /// Connect under `policy`
    pub fn connect(policy: &ConnectionPolicy) -> Result<Self> {
        Ok(Self::with_connection(create_connection(policy)?))
    }

    /// Connect using a connection produced by `manager`
    pub fn with_manager(manager: &ConnectionManager) -> Result<Self> {
        Ok(Self::with_connection(manager.create_connection()?))
    }

    /// Take ownership of an established connection
    pub fn with_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Read the value stored at `key`
    ///
    /// Fails with `NotFound` when the key has never been written.
    pub fn read(&mut self, key: impl Into<Key>) -> Result<Value> {
        self.ensure_open()?;
        let key = key.into();
        let request = OperationCodec::encode_read(&key)?;
        let result = self.execute("read", &key, &request)?;
        ErrorClassifier::read(result)
    }

    /// Store `value` at `key`, creating or replacing it
    pub fn write(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        self.ensure_open()?;
        let key = key.into();
        let request = OperationCodec::encode_write(&key, &value.into())?;
        let result = self.execute("write", &key, &request)?;
        ErrorClassifier::write(result)
    }

    /// Replace the value at `key` with `new_value` iff it currently equals
    /// `expected`
    ///
    /// The store compares encoded bytes and swaps in one indivisible step.
    /// On mismatch nothing is modified and the error carries the value that
    /// is actually stored, so the caller can retry against it. A missing key
    /// fails with `NotFound`; test-and-set never creates keys.
    pub fn test_and_set(
        &mut self,
        key: impl Into<Key>,
        expected: impl Into<Value>,
        new_value: impl Into<Value>,
    ) -> Result<()> {
        self.ensure_open()?;
        let key = key.into();
        let request = OperationCodec::encode_test_and_set(&key, &expected.into(), &new_value.into())?;
        let result = self.execute("test_and_set", &key, &request)?;
        ErrorClassifier::test_and_set(result)
    }

    /// Close the connection; harmless when already closed
    pub fn close_connection(&mut self) {
        self.connection.close();
    }

    pub fn is_closed(&self) -> bool {
        !self.connection.is_open()
    }

    /// Address of the node this instance talks to
    pub fn node(&self) -> &str {
        self.connection.node()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.connection.is_open() {
            Ok(())
        } else {
            Err(ErrorClassifier::closed())
        }
    }

    fn execute(&mut self, op: &str, key: &Key, request: &[u8]) -> Result<OperationResult> {
        let response = self.connection.round_trip(request)?;
        let result = OperationCodec::decode(&response);
        tracing::trace!(key = %key, "{} -> {:?}", op, result);
        Ok(result)
    }
}

impl Drop for TransactionSingleOp {
    fn drop(&mut self) {
        self.connection.close();
    }
}

//! Store Module
//!
//! In-memory key-value store backing the reference node.
//!
//! ## Concurrency Model
//! BTreeMap wrapped in a parking_lot RwLock:
//! - Reads share the lock
//! - Writes and test-and-set take the write lock, so the comparison and the
//!   replacement of a test-and-set happen as one step relative to every other
//!   operation on the store

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::protocol::{Command, Response};

/// Outcome of a test-and-set against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The stored value matched and was replaced
    Replaced,

    /// The stored value differed; it is returned unchanged
    Mismatch(Vec<u8>),

    /// Nothing is stored under the key
    Missing,
}

/// In-memory store for a single node
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn read(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair, creating or replacing it (write lock)
    pub fn write(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.write().insert(key, value);
    }

    /// Replace the value at `key` iff it equals `expected` byte for byte
    pub fn test_and_set(&self, key: &[u8], expected: &[u8], value: Vec<u8>) -> SwapOutcome {
        let mut data = self.data.write();
        match data.get_mut(key) {
            None => SwapOutcome::Missing,
            Some(current) if current.as_slice() == expected => {
                *current = value;
                SwapOutcome::Replaced
            }
            Some(current) => SwapOutcome::Mismatch(current.clone()),
        }
    }

    /// Execute a decoded command and build the wire response
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::Read { key } => match self.read(&key) {
                Some(value) => Response::ok(Some(value)),
                None => Response::not_found(),
            },
            Command::Write { key, value } => {
                self.write(key, value);
                Response::ok(None)
            }
            Command::TestAndSet { key, expected, value } => {
                match self.test_and_set(&key, &expected, value) {
                    SwapOutcome::Replaced => Response::ok(None),
                    SwapOutcome::Mismatch(old) => Response::key_changed(old),
                    SwapOutcome::Missing => Response::not_found(),
                }
            }
        }
    }

    /// Number of stored keys
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Approximate size of stored keys and values in bytes
    pub fn size(&self) -> usize {
        self.data.read().iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

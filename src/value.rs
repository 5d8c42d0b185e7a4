//! Keys and values
//!
//! Keys are opaque byte strings. Values are small composite payloads
//! serialized with bincode; two values are equal for test-and-set purposes
//! exactly when their wire encodings are equal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Opaque identifier addressing one stored value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Key(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(s.as_bytes().to_vec())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s.into_bytes())
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Key(bytes)
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Key(bytes.to_vec())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Payload stored under a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Raw bytes
    Bytes(Vec<u8>),

    /// UTF-8 string
    Str(String),

    /// Signed integer
    Int(i64),

    Bool(bool),

    /// Symbolic constant, e.g. `ok`
    Atom(String),

    /// Variable-length sequence
    List(Vec<Value>),

    /// Fixed-shape composite, e.g. `{title, text}`
    Tuple(Vec<Value>),
}

impl Value {
    /// Encode to the bytes sent over the wire
    ///
    /// Deterministic: the same value always yields the same bytes.
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ClientError::Unknown(format!("Value encoding failed: {}", e)))
    }

    /// Decode bytes received from the wire
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| ClientError::Unknown(format!("Value decoding failed: {}", e)))
    }

    /// Equality as the store decides it: on encoded bytes
    pub fn wire_eq(&self, other: &Value) -> Result<bool> {
        Ok(self.to_wire()? == other.to_wire()?)
    }

    /// The string payload, if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The byte payload, if this is `Bytes`
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Atom(a) => write!(f, "{}", a),
            Value::List(items) => write_seq(f, items, '[', ']'),
            Value::Tuple(items) => write_seq(f, items, '{', '}'),
        }
    }
}

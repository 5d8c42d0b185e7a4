//! Command definitions
//!
//! Logical requests a client sends to a node. Keys and values travel as
//! bytes; values are already in their wire encoding.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Read = 0x01,
    Write = 0x02,
    TestAndSet = 0x03,
}

impl CommandType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(CommandType::Read),
            0x02 => Some(CommandType::Write),
            0x03 => Some(CommandType::TestAndSet),
            _ => None,
        }
    }
}

/// A single-key operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the value stored at a key
    Read { key: Vec<u8> },

    /// Replace (or create) the value stored at a key
    Write { key: Vec<u8>, value: Vec<u8> },

    /// Replace the value at a key iff it currently equals `expected`
    TestAndSet {
        key: Vec<u8>,
        expected: Vec<u8>,
        value: Vec<u8>,
    },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Read { .. } => CommandType::Read,
            Command::Write { .. } => CommandType::Write,
            Command::TestAndSet { .. } => CommandType::TestAndSet,
        }
    }

    /// The key this command addresses
    pub fn key(&self) -> &[u8] {
        match self {
            Command::Read { key } | Command::Write { key, .. } | Command::TestAndSet { key, .. } => key,
        }
    }
}

//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Frame Format (requests and responses)
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────────────┐
//! │ Tag (1)  │ Len (4)  │ CRC (4)  │       Payload        │
//! └──────────┴──────────┴──────────┴──────────────────────┘
//! ```
//!
//! The CRC32 covers the payload only. Every variable-length field inside a
//! command payload is prefixed with its length (4 bytes, big-endian).
//!
//! Response decoding never fails: anything malformed becomes
//! `OperationResult::Unknown` so the only faults a caller sees from the
//! network are genuine transport faults.

use std::io::{self, Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{Command, CommandType, OperationResult, Response, Status};
use crate::error::{ClientError, Result};
use crate::value::{Key, Value};

/// Header size: 1 byte tag + 4 bytes length + 4 bytes CRC
pub const HEADER_SIZE: usize = 9;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Framing
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload.len() as u32);
    message.put_u32(crc32fast::hash(payload));
    message.put_slice(payload);
    message.to_vec()
}

/// Split a complete frame into its tag and verified payload
fn parse_frame(bytes: &[u8]) -> std::result::Result<(u8, &[u8]), String> {
    if bytes.len() < HEADER_SIZE {
        return Err(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        ));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let tag = header.get_u8();
    let payload_len = header.get_u32() as usize;
    let expected_crc = header.get_u32();

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        ));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() != total_len {
        return Err(format!(
            "Frame length mismatch: expected {} bytes, got {}",
            total_len,
            bytes.len()
        ));
    }

    let payload = &bytes[HEADER_SIZE..];
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(format!(
            "Checksum mismatch: expected 0x{:08x}, got 0x{:08x}",
            expected_crc, actual_crc
        ));
    }

    Ok((tag, payload))
}

fn put_field(buf: &mut BytesMut, field: &[u8]) {
    buf.put_u32(field.len() as u32);
    buf.put_slice(field);
}

fn take_field(buf: &mut &[u8], name: &str) -> std::result::Result<Vec<u8>, String> {
    if buf.remaining() < 4 {
        return Err(format!("missing {} length", name));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(format!(
            "incomplete {} (expected {}, got {})",
            name,
            len,
            buf.remaining()
        ));
    }
    let field = buf[..len].to_vec();
    buf.advance(len);
    Ok(field)
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Deterministic: equal commands always produce equal frames. The payload
/// size is not checked here; `OperationCodec` refuses oversized requests.
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();
    match command {
        Command::Read { key } => {
            put_field(&mut payload, key);
        }
        Command::Write { key, value } => {
            put_field(&mut payload, key);
            put_field(&mut payload, value);
        }
        Command::TestAndSet { key, expected, value } => {
            put_field(&mut payload, key);
            put_field(&mut payload, expected);
            put_field(&mut payload, value);
        }
    }
    frame(command.command_type() as u8, &payload)
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, payload) = parse_frame(bytes).map_err(ClientError::Unknown)?;

    let cmd_type = CommandType::from_u8(tag)
        .ok_or_else(|| ClientError::Unknown(format!("Unknown command type: 0x{:02x}", tag)))?;

    let mut buf = payload;
    let parsed = match cmd_type {
        CommandType::Read => take_field(&mut buf, "key").map(|key| Command::Read { key }),
        CommandType::Write => take_field(&mut buf, "key").and_then(|key| {
            let value = take_field(&mut buf, "value")?;
            Ok(Command::Write { key, value })
        }),
        CommandType::TestAndSet => take_field(&mut buf, "key").and_then(|key| {
            let expected = take_field(&mut buf, "expected value")?;
            let value = take_field(&mut buf, "new value")?;
            Ok(Command::TestAndSet { key, expected, value })
        }),
    };

    let command = parsed.map_err(|e| ClientError::Unknown(format!("{:?} command: {}", cmd_type, e)))?;
    if buf.has_remaining() {
        return Err(ClientError::Unknown(format!(
            "{:?} command: {} trailing bytes",
            cmd_type,
            buf.remaining()
        )));
    }
    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response frame into an operation outcome
///
/// Never fails; malformed input yields `OperationResult::Unknown`.
pub fn decode_response(bytes: &[u8]) -> OperationResult {
    let (tag, payload) = match parse_frame(bytes) {
        Ok(parts) => parts,
        Err(reason) => return OperationResult::Unknown(reason),
    };

    let status = match Status::from_u8(tag) {
        Some(status) => status,
        None => return OperationResult::Unknown(format!("Unknown response status: 0x{:02x}", tag)),
    };

    match status {
        Status::Ok if payload.is_empty() => OperationResult::Done,
        Status::Ok => match Value::from_wire(payload) {
            Ok(value) => OperationResult::Value(value),
            Err(e) => OperationResult::Unknown(e.to_string()),
        },
        Status::NotFound => OperationResult::NotFound,
        Status::Abort => OperationResult::Aborted(String::from_utf8_lossy(payload).into_owned()),
        Status::KeyChanged => match Value::from_wire(payload) {
            Ok(old) => OperationResult::KeyChanged(old),
            Err(e) => OperationResult::Unknown(format!("KEY_CHANGED without readable value: {}", e)),
        },
        Status::Unknown => OperationResult::Unknown(String::from_utf8_lossy(payload).into_owned()),
    }
}

// =============================================================================
// Typed Operation Codec
// =============================================================================

/// Encodes typed single-key operations and decodes their outcomes
///
/// Encoding fails with `Unknown` when the request would exceed
/// `MAX_PAYLOAD_SIZE`, so an oversized value is refused before any network
/// access instead of being rejected by the node.
pub struct OperationCodec;

impl OperationCodec {
    pub fn encode_read(key: &Key) -> Result<Vec<u8>> {
        checked_encode(&Command::Read {
            key: key.as_bytes().to_vec(),
        })
    }

    pub fn encode_write(key: &Key, value: &Value) -> Result<Vec<u8>> {
        checked_encode(&Command::Write {
            key: key.as_bytes().to_vec(),
            value: value.to_wire()?,
        })
    }

    pub fn encode_test_and_set(key: &Key, expected: &Value, new_value: &Value) -> Result<Vec<u8>> {
        checked_encode(&Command::TestAndSet {
            key: key.as_bytes().to_vec(),
            expected: expected.to_wire()?,
            value: new_value.to_wire()?,
        })
    }

    pub fn decode(frame: &[u8]) -> OperationResult {
        decode_response(frame)
    }
}

/// Payload size `encode_command` would produce for `command`
fn payload_len(command: &Command) -> usize {
    // Each field carries a 4-byte length prefix
    match command {
        Command::Read { key } => 4 + key.len(),
        Command::Write { key, value } => 8 + key.len() + value.len(),
        Command::TestAndSet { key, expected, value } => 12 + key.len() + expected.len() + value.len(),
    }
}

fn checked_encode(command: &Command) -> Result<Vec<u8>> {
    let size = payload_len(command);
    if size > MAX_PAYLOAD_SIZE as usize {
        return Err(ClientError::Unknown(format!(
            "{:?} request too large: {} bytes (max {})",
            command.command_type(),
            size,
            MAX_PAYLOAD_SIZE
        )));
    }
    Ok(encode_command(command))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame from a stream
///
/// Blocks until the frame is received. Only the length is checked here;
/// checksum and content are left to the decoder.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    // An oversized length leaves the stream position unknowable
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Payload too large: {} bytes (max {})", payload_len, MAX_PAYLOAD_SIZE),
        ));
    }

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Write one complete frame to a stream and flush it
pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    writer.write_all(frame)?;
    writer.flush()
}

//! Protocol Module
//!
//! Defines the wire protocol between clients and store nodes.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────────────┐
//! │ Tag (1)  │ Len (4)  │ CRC (4)  │       Payload        │
//! └──────────┴──────────┴──────────┴──────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: READ         - Payload: key_len (4) + key
//! - 0x02: WRITE        - Payload: key_len (4) + key + value_len (4) + value
//! - 0x03: TEST_AND_SET - Payload: key_len (4) + key + expected_len (4) + expected
//!   + value_len (4) + value
//!
//! ### Status Codes
//! - 0x00: OK          - Payload: empty or value
//! - 0x01: NOT_FOUND   - Payload: empty
//! - 0x02: ABORT       - Payload: reason
//! - 0x03: KEY_CHANGED - Payload: current value
//! - 0x04: UNKNOWN     - Payload: reason

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{OperationResult, Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_frame, write_frame,
    OperationCodec, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};

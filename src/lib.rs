//! # singleop
//!
//! Single-key atomic operations against a remote key-value store, without a
//! multi-statement transaction:
//! - `read`, `write` and `test_and_set`, each its own atomic transaction
//! - Explicit connection lifecycle with bounded connect-time retries
//! - A fixed error taxonomy separating connectivity from store outcomes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TransactionSingleOp                        │
//! │              (read / write / test_and_set)                   │
//! └──────────┬──────────────────┬───────────────────┬───────────┘
//!            │                  │                   │
//!            ▼                  ▼                   ▼
//!   ┌────────────────┐  ┌───────────────┐  ┌─────────────────┐
//!   │ OperationCodec │  │  Connection   │  │ ErrorClassifier │
//!   │ (frames, CRC)  │  │ (Open/Closed) │  │  (ClientError)  │
//!   └────────────────┘  └───────▲───────┘  └─────────────────┘
//!                               │
//!                    ┌──────────┴─────────┐
//!                    │ ConnectionManager  │
//!                    │ (ConnectionPolicy) │
//!                    └──────────┬─────────┘
//!                               │ TCP
//!                               ▼
//!                    ┌────────────────────┐
//!                    │    Store node      │
//!                    └────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use singleop::{ClientError, ConnectionPolicy, TransactionSingleOp};
//!
//! let policy = ConnectionPolicy::builder().node("127.0.0.1:8000").build();
//! let mut tx = TransactionSingleOp::connect(&policy)?;
//!
//! tx.write("K1", "ahz2ieSh")?;
//! match tx.test_and_set("K1", "ahz2ieSh", "wooPhu8u") {
//!     Ok(()) => {}
//!     Err(ClientError::KeyChanged { old_value }) => println!("now {}", old_value),
//!     Err(e) => return Err(e),
//! }
//! tx.close_connection();
//! # Ok::<(), ClientError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod value;

pub mod protocol;
pub mod network;
pub mod store;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ClientError, ErrorKind, Result};
pub use config::{ConnectionPolicy, NodeConfig, NodeSelection};
pub use value::{Key, Value};
pub use network::{create_connection, Connection, ConnectionManager, NodeServer};
pub use client::TransactionSingleOp;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of singleop
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Network Module
//!
//! Client-side channels to store nodes, and the reference node itself.
//!
//! ## Architecture
//! - `Connection`: one blocking TCP channel, Open or Closed
//! - `ConnectionManager`: builds connections under a `ConnectionPolicy`,
//!   retrying connect failures up to the policy's bound
//! - `NodeServer`: single acceptor thread, worker thread pool for sessions,
//!   requests executed against a shared `Store`

mod connection;
mod manager;
mod server;
mod session;

pub use connection::{Connection, ConnectionState};
pub use manager::{create_connection, ConnectionManager};
pub use server::{NodeHandle, NodeServer};
pub use session::Session;

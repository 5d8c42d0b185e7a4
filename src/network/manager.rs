//! Connection Manager
//!
//! Produces ready-to-use connections under a `ConnectionPolicy`, enforcing
//! the connect-time retry bound.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use super::Connection;
use crate::config::{ConnectionPolicy, NodeSelection};
use crate::error::{ClientError, Result};

/// Round-robin cursor for connections made without a long-lived manager
static PROCESS_CURSOR: AtomicUsize = AtomicUsize::new(0);

/// Creates connections according to a policy
///
/// Holds no state visible outside the connections it returns; the only
/// internal state is the round-robin cursor.
#[derive(Debug)]
pub struct ConnectionManager {
    policy: ConnectionPolicy,

    /// Where the next round-robin connection starts
    next_node: AtomicUsize,
}

impl ConnectionManager {
    pub fn new(policy: ConnectionPolicy) -> Self {
        Self {
            policy,
            next_node: AtomicUsize::new(0),
        }
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    /// Establish a new connection
    ///
    /// Makes one attempt plus up to `max_retries` more, each against the
    /// next node in the list. Fails with a connection error carrying the
    /// last transport error once all attempts are spent.
    pub fn create_connection(&self) -> Result<Connection> {
        self.connect_from(&self.next_node)
    }

    fn connect_from(&self, cursor: &AtomicUsize) -> Result<Connection> {
        self.policy.validate()?;

        let nodes = &self.policy.nodes;
        let start = match self.policy.node_selection {
            NodeSelection::Ordered => 0,
            NodeSelection::RoundRobin => cursor.fetch_add(1, Ordering::Relaxed),
        };
        let attempts = self.policy.max_attempts();

        let mut last_error = None;
        for attempt in 0..attempts {
            let node = &nodes[start.wrapping_add(attempt as usize) % nodes.len()];

            match Connection::open(node, &self.policy) {
                Ok(connection) => return Ok(connection),
                Err(e) => {
                    tracing::warn!(
                        client = %self.policy.client_name,
                        "Connect attempt {}/{} to {} failed: {}",
                        attempt + 1,
                        attempts,
                        node,
                        e
                    );
                    last_error = Some(format!("{}: {}", node, e));
                }
            }

            if attempt + 1 < attempts {
                if let Some(delay) = self.policy.retry_delay() {
                    thread::sleep(delay);
                }
            }
        }

        Err(ClientError::Connection(format!(
            "could not connect after {} attempt(s), last error: {}",
            attempts,
            last_error.unwrap_or_else(|| "none".to_string())
        )))
    }
}

/// Establish a connection under `policy` without keeping a manager around
///
/// Round-robin selection advances a process-wide cursor, so successive
/// calls still spread over the node list.
pub fn create_connection(policy: &ConnectionPolicy) -> Result<Connection> {
    ConnectionManager::new(policy.clone()).connect_from(&PROCESS_CURSOR)
}

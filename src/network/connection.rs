//! Client Connection
//!
//! One logical channel to a store node with an explicit Open/Closed
//! lifecycle. Once closed it is never reopened.

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use crate::client::ErrorClassifier;
use crate::config::ConnectionPolicy;
use crate::error::Result;
use crate::protocol::{read_frame, write_frame};

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// A channel to a single store node
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    state: ConnectionState,

    /// Node address for logging
    node: String,

    /// Client name from the policy, for logging
    name: String,
}

impl Connection {
    /// Open a channel to `node` using the transport settings of `policy`
    ///
    /// A single attempt; retries are the connection manager's business.
    pub fn open(node: &str, policy: &ConnectionPolicy) -> io::Result<Self> {
        let stream = connect(node, policy)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(policy.read_timeout())?;
        stream.set_write_timeout(policy.write_timeout())?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!(client = %policy.client_name, "Connected to {}", node);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            state: ConnectionState::Open,
            node: node.to_string(),
            name: policy.client_name.clone(),
        })
    }

    /// Send one request frame and block for its response frame
    ///
    /// Fails without touching the network when closed. Any transport fault
    /// closes the connection, since the stream position is no longer known.
    pub fn round_trip(&mut self, request: &[u8]) -> Result<Vec<u8>> {
        if self.state == ConnectionState::Closed {
            return Err(ErrorClassifier::closed());
        }

        let exchanged = write_frame(&mut self.writer, request).and_then(|_| read_frame(&mut self.reader));

        match exchanged {
            Ok(response) => {
                tracing::trace!(
                    client = %self.name,
                    "{} answered with {} bytes",
                    self.node,
                    response.len()
                );
                Ok(response)
            }
            Err(e) => {
                let err = ErrorClassifier::transport(&e, &self.node);
                tracing::warn!(client = %self.name, "Transport failure on {}: {}", self.node, e);
                self.close();
                Err(err)
            }
        }
    }

    /// Close the connection. Repeated calls are no-ops.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        // The peer may already be gone; nothing useful to report
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
        tracing::debug!(client = %self.name, "Closed connection to {}", self.node);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Address of the node this connection talks to
    pub fn node(&self) -> &str {
        &self.node
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("node", &self.node)
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

/// Resolve `node` and connect to the first address that accepts
fn connect(node: &str, policy: &ConnectionPolicy) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = node.to_socket_addrs()?.collect();

    let mut last_error = io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        format!("{} did not resolve to any address", node),
    );
    for addr in addrs {
        let attempt = match policy.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

//! Node Session
//!
//! Serves one client connection on the node side: requests are handled
//! strictly one after another, in arrival order.

use std::io::{self, BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;

use crate::config::NodeConfig;
use crate::protocol::{decode_command, encode_response, read_frame, write_frame, Response};
use crate::store::Store;

/// Handles a single client connection
pub struct Session {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the node's store
    store: Arc<Store>,

    /// Peer address for logging
    peer_addr: String,
}

impl Session {
    /// Create a new session, configuring the stream from `config`
    pub fn new(stream: TcpStream, store: Arc<Store>, config: &NodeConfig) -> io::Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.idle_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            store,
            peer_addr,
        })
    }

    /// Serve requests until the client goes away (blocking)
    pub fn handle(&mut self) -> io::Result<()> {
        tracing::debug!("Session opened for {}", self.peer_addr);

        loop {
            let frame = match read_frame(&mut self.reader) {
                Ok(frame) => frame,
                Err(ref e) if is_disconnect(e) => {
                    tracing::debug!("Client {} went away: {}", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Framing is lost; tell the client if we still can
                    let _ = self.send(&Response::unknown(&e.to_string()));
                    return Err(e);
                }
            };

            let response = match decode_command(&frame) {
                Ok(command) => {
                    tracing::trace!("Received {:?} from {}", command.command_type(), self.peer_addr);
                    self.store.execute(command)
                }
                Err(e) => {
                    tracing::debug!("Rejecting request from {}: {}", self.peer_addr, e);
                    Response::unknown(&e.to_string())
                }
            };

            if let Err(e) = self.send(&response) {
                if is_disconnect(&e) {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    fn send(&mut self, response: &Response) -> io::Result<()> {
        write_frame(&mut self.writer, &encode_response(response))
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Client hung up, reset the stream, or sat idle past the timeout
fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

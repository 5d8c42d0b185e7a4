//! Reference Node
//!
//! A TCP node speaking the single-operation protocol over an in-memory
//! `Store`. Accepts connections and dispatches them to worker threads.

use std::collections::HashMap;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;

use super::Session;
use crate::config::NodeConfig;
use crate::error::{ClientError, Result};
use crate::store::Store;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// State shared by the acceptor, the workers and any handle
struct Shared {
    config: NodeConfig,
    store: Arc<Store>,
    shutdown: AtomicBool,

    /// Live client streams, so shutdown can unblock their workers
    sessions: Mutex<HashMap<u64, TcpStream>>,
    next_session: AtomicU64,
}

/// TCP server for a single store node
pub struct NodeServer {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl NodeServer {
    /// Bind a node with a fresh, empty store
    pub fn bind(config: NodeConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(Store::new()))
    }

    /// Bind a node serving an existing store
    pub fn with_store(config: NodeConfig, store: Arc<Store>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)
            .map_err(|e| ClientError::Connection(format!("cannot bind {}: {}", config.listen_addr, e)))?;

        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                config,
                store,
                shutdown: AtomicBool::new(false),
                sessions: Mutex::new(HashMap::new()),
                next_session: AtomicU64::new(0),
            }),
        })
    }

    /// The address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(io_error)
    }

    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.shared.store)
    }

    /// Start the server (blocking until `shutdown` is signalled)
    pub fn run(&self) -> Result<()> {
        self.listener.set_nonblocking(true).map_err(io_error)?;

        let (tx, rx) = channel::unbounded::<TcpStream>();
        let mut workers = Vec::with_capacity(self.shared.config.workers);
        for id in 0..self.shared.config.workers.max(1) {
            let rx = rx.clone();
            let shared = Arc::clone(&self.shared);
            let worker = thread::Builder::new()
                .name(format!("singleop-worker-{}", id))
                .spawn(move || worker_loop(rx, shared))
                .map_err(io_error)?;
            workers.push(worker);
        }
        drop(rx);

        let addr = self.local_addr()?;
        tracing::info!("Node listening on {} with {} workers", addr, workers.len());

        while !self.shared.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::trace!("Accepted connection from {}", peer);
                    if tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        drop(tx);
        for (_, stream) in self.shared.sessions.lock().drain() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        for worker in workers {
            let _ = worker.join();
        }

        tracing::info!("Node stopped");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
    }

    /// Run the server on a background thread
    pub fn spawn(self) -> Result<NodeHandle> {
        let addr = self.local_addr()?;
        let shared = Arc::clone(&self.shared);
        let thread = thread::Builder::new()
            .name("singleop-acceptor".to_string())
            .spawn(move || self.run())
            .map_err(io_error)?;

        Ok(NodeHandle {
            addr,
            shared,
            thread: Some(thread),
        })
    }
}

/// Handle to a node running in the background; shuts it down on drop
pub struct NodeHandle {
    addr: SocketAddr,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl NodeHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.shared.store
    }

    /// Stop the node and wait for its threads
    pub fn shutdown(&mut self) -> Result<()> {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .unwrap_or_else(|_| Err(ClientError::Unknown("node thread panicked".to_string()))),
            None => Ok(()),
        }
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!("Node shutdown failed: {}", e);
        }
    }
}

fn worker_loop(rx: Receiver<TcpStream>, shared: Arc<Shared>) {
    for stream in rx.iter() {
        let id = shared.next_session.fetch_add(1, Ordering::Relaxed);
        if let Ok(registered) = stream.try_clone() {
            shared.sessions.lock().insert(id, registered);
        }

        // Registered before this check, so a concurrent shutdown either sees
        // the stream or has already set the flag
        if !shared.shutdown.load(Ordering::SeqCst) {
            match Session::new(stream, Arc::clone(&shared.store), &shared.config) {
                Ok(mut session) => {
                    if let Err(e) = session.handle() {
                        tracing::debug!("Session for {} ended with error: {}", session.peer_addr(), e);
                    }
                }
                Err(e) => tracing::warn!("Failed to set up session: {}", e),
            }
        }

        shared.sessions.lock().remove(&id);
    }
}

fn io_error(e: io::Error) -> ClientError {
    ClientError::Connection(e.to_string())
}

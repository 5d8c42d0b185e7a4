//! Configuration for singleop
//!
//! `ConnectionPolicy` is the immutable client-side configuration: which nodes
//! exist, how to pick one, how many times to retry establishing a channel,
//! and the transport timeouts. Built once, then shared read-only.
//!
//! `NodeConfig` configures the reference node.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Environment variable holding a comma-separated node list
pub const ENV_NODES: &str = "SINGLEOP_NODES";

/// Environment variable overriding the connect retry bound
pub const ENV_MAX_RETRIES: &str = "SINGLEOP_MAX_RETRIES";

/// How a connection manager chooses the first node to try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSelection {
    /// Always start at the first configured node
    Ordered,

    /// Each new connection starts one node further along the list
    RoundRobin,
}

/// Configuration governing node selection and connect-time retries
#[derive(Debug, Clone)]
pub struct ConnectionPolicy {
    // -------------------------------------------------------------------------
    // Node Selection
    // -------------------------------------------------------------------------
    /// Candidate node addresses (host:port)
    pub nodes: Vec<String>,

    /// Strategy for choosing where the first attempt goes
    pub node_selection: NodeSelection,

    // -------------------------------------------------------------------------
    // Retry Configuration
    // -------------------------------------------------------------------------
    /// Additional connect attempts after the first one fails.
    /// Zero means exactly one attempt.
    pub max_retries: u32,

    /// Pause between connect attempts (milliseconds)
    pub retry_delay_ms: u64,

    // -------------------------------------------------------------------------
    // Transport Configuration
    // -------------------------------------------------------------------------
    /// TCP connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Response wait bound (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Request send bound (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,

    /// Label attached to log output of connections made under this policy
    pub client_name: String,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            nodes: vec!["127.0.0.1:8000".to_string()],
            node_selection: NodeSelection::RoundRobin,
            max_retries: 3,
            retry_delay_ms: 100,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            client_name: "singleop".to_string(),
        }
    }
}

impl ConnectionPolicy {
    /// Create a new policy builder
    pub fn builder() -> ConnectionPolicyBuilder {
        ConnectionPolicyBuilder::default()
    }

    /// Default policy overlaid with `SINGLEOP_NODES` / `SINGLEOP_MAX_RETRIES`
    pub fn from_env() -> Result<Self> {
        let nodes = std::env::var(ENV_NODES).ok();
        let retries = std::env::var(ENV_MAX_RETRIES).ok();
        Self::default().overlay(nodes.as_deref(), retries.as_deref())
    }

    fn overlay(mut self, nodes: Option<&str>, retries: Option<&str>) -> Result<Self> {
        if let Some(list) = nodes {
            let parsed: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect();
            if parsed.is_empty() {
                return Err(ClientError::Unknown(format!("{} is set but lists no nodes", ENV_NODES)));
            }
            self.nodes = parsed;
        }
        if let Some(raw) = retries {
            self.max_retries = raw.trim().parse().map_err(|_| {
                ClientError::Unknown(format!("{} is not a valid retry count: {:?}", ENV_MAX_RETRIES, raw))
            })?;
        }
        Ok(self)
    }

    /// Check the policy can produce a connection at all
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ClientError::Connection("no nodes configured".to_string()));
        }
        Ok(())
    }

    /// Total connect attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn retry_delay(&self) -> Option<Duration> {
        millis(self.retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

/// Builder for ConnectionPolicy
#[derive(Default)]
pub struct ConnectionPolicyBuilder {
    policy: ConnectionPolicy,
}

impl ConnectionPolicyBuilder {
    /// Use a single node
    pub fn node(mut self, addr: impl Into<String>) -> Self {
        self.policy.nodes = vec![addr.into()];
        self
    }

    /// Replace the node list
    pub fn nodes<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.nodes = addrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn node_selection(mut self, selection: NodeSelection) -> Self {
        self.policy.node_selection = selection;
        self
    }

    /// Set the number of connect retries (0 = single attempt)
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.policy.max_retries = retries;
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.policy.retry_delay_ms = ms;
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.policy.connect_timeout_ms = ms;
        self
    }

    /// Set the response wait bound (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.policy.read_timeout_ms = ms;
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.policy.write_timeout_ms = ms;
        self
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.policy.client_name = name.into();
        self
    }

    pub fn build(self) -> ConnectionPolicy {
        self.policy
    }
}

// =============================================================================
// Node Configuration
// =============================================================================

/// Configuration for a reference node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// TCP listen address
    pub listen_addr: String,

    /// Worker threads; each serves one client connection at a time
    pub workers: usize,

    /// Close client connections idle for this long (milliseconds, 0 = never)
    pub idle_timeout_ms: u64,

    /// Response send bound (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            workers: 16,
            idle_timeout_ms: 60_000,
            write_timeout_ms: 5000,
        }
    }
}

impl NodeConfig {
    /// Create a new node config builder
    pub fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::default()
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        millis(self.idle_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

/// Builder for NodeConfig
#[derive(Default)]
pub struct NodeConfigBuilder {
    config: NodeConfig,
}

impl NodeConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the worker count (at least one worker always runs)
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count.max(1);
        self
    }

    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.idle_timeout_ms = ms;
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> NodeConfig {
        self.config
    }
}

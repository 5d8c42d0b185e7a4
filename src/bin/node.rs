//! singleop Node Binary
//!
//! Runs a reference store node speaking the single-operation protocol.

use clap::Parser;
use singleop::{NodeConfig, NodeServer};
use tracing_subscriber::{fmt, EnvFilter};

/// singleop reference node
#[derive(Parser, Debug)]
#[command(name = "singleop-node")]
#[command(about = "In-memory store node for single-operation transactions")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    listen: String,

    /// Worker threads (concurrent client connections)
    #[arg(short, long, default_value = "16")]
    workers: usize,

    /// Drop clients idle for this many seconds (0 = never)
    #[arg(long, default_value = "60")]
    idle_timeout_secs: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,singleop=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("singleop node v{}", singleop::VERSION);

    let config = NodeConfig::builder()
        .listen_addr(&args.listen)
        .workers(args.workers)
        .idle_timeout_ms(args.idle_timeout_secs * 1000)
        .build();

    let server = match NodeServer::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start node: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Node error: {}", e);
        std::process::exit(1);
    }
}

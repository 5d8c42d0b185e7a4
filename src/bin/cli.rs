//! singleop CLI Client
//!
//! Command-line interface for single-key operations.

use clap::{Parser, Subcommand};
use singleop::{ClientError, ConnectionPolicy, TransactionSingleOp};
use tracing_subscriber::{fmt, EnvFilter};

/// singleop CLI
#[derive(Parser, Debug)]
#[command(name = "singleop-cli")]
#[command(about = "Read, write and test-and-set single keys")]
#[command(version)]
struct Args {
    /// Node address; repeat to give fallbacks (default: SINGLEOP_NODES)
    #[arg(short, long)]
    node: Vec<String>,

    /// Connect retries after the first attempt
    #[arg(short, long)]
    max_retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read the value of a key
    Read {
        /// The key to read
        key: String,
    },

    /// Write a key-value pair
    Write {
        /// The key to write
        key: String,

        /// The value to write
        value: String,
    },

    /// Replace a value only if it still equals the expected one
    TestAndSet {
        /// The key to update
        key: String,

        /// The value the key must currently hold
        expected: String,

        /// The replacement value
        value: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), ClientError> {
    let mut policy = ConnectionPolicy::from_env()?;
    if !args.node.is_empty() {
        policy.nodes = args.node;
    }
    if let Some(retries) = args.max_retries {
        policy.max_retries = retries;
    }

    let mut tx = TransactionSingleOp::connect(&policy)?;
    let outcome = match args.command {
        Commands::Read { key } => tx.read(key).map(|value| println!("{}", value)),
        Commands::Write { key, value } => tx.write(key, value).map(|_| println!("ok")),
        Commands::TestAndSet { key, expected, value } => {
            tx.test_and_set(key, expected, value).map(|_| println!("ok"))
        }
    };
    tx.close_connection();
    outcome
}

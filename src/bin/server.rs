//! CairnKV Server Binary
//!
//! Starts the TCP server for CairnKV.

use std::sync::Arc;

use cairnkv::network::Server;
use cairnkv::{Config, Store};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// CairnKV Server
#[derive(Parser, Debug)]
#[command(name = "cairnkv-server")]
#[command(about = "Networked key-value store with pub/sub and snapshots")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./cairnkv_data")]
    data_dir: String,

    /// Snapshot file name inside the data directory
    #[arg(long, default_value = "snapshot.db")]
    snapshot_file: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cairnkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("CairnKV Server v{}", cairnkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .snapshot_file(&args.snapshot_file)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let store = match Store::open(&config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Store ready: {} scalar keys from {}",
        store.scalar_count(),
        store.snapshot_path().display()
    );

    let server = match Server::bind(config, store) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

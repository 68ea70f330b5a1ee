//! Redline - A Minimal Key-Value Server
//!
//! This is the main entry point for the Redline server.
//! It parses arguments, sets up logging and the store, and serves until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use redline::commands::CommandHandler;
use redline::storage::{DuplicatePolicy, MemoryStore};
use redline::{Server, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Redline Server
#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(about = "Minimal in-memory key-value server")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, env = "REDLINE_HOST", default_value = redline::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "REDLINE_PORT", default_value_t = redline::DEFAULT_PORT)]
    port: u16,

    /// Refuse SET on keys that already exist
    #[arg(long, env = "REDLINE_REJECT_DUPLICATES")]
    reject_duplicates: bool,

    /// Deadline for reading a request, in milliseconds
    #[arg(long, default_value_t = 5000)]
    read_timeout_ms: u64,

    /// TCP keep-alive period, in seconds
    #[arg(long, default_value_t = 300)]
    keepalive_secs: u64,

    /// Request buffer capacity, in bytes
    #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u64).range(1..))]
    buffer_size: u64,

    /// How long shutdown waits for open connections, in milliseconds
    #[arg(long, default_value_t = 5000)]
    drain_timeout_ms: u64,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let duplicate_policy = if self.reject_duplicates {
            DuplicatePolicy::Reject
        } else {
            DuplicatePolicy::Overwrite
        };

        Ok(ServerConfig {
            host: self.host,
            port: self.port,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            keepalive: Duration::from_secs(self.keepalive_secs),
            buffer_size: usize::try_from(self.buffer_size).context("buffer size too large")?,
            drain_timeout: Duration::from_millis(self.drain_timeout_ms),
            duplicate_policy,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    info!("Redline v{}", redline::VERSION);

    // The store is shared across all connections
    let storage = Arc::new(MemoryStore::with_policy(config.duplicate_policy));
    info!(policy = ?storage.policy(), "Store initialized");

    let handler = CommandHandler::new(Arc::clone(&storage) as Arc<dyn redline::DataStore>);
    let bind_address = config.bind_address();
    let server = Server::bind(config, handler)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    let stats = server.stats();

    let summary = server
        .run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    let store_stats = storage.stats();
    info!(
        completed = summary.completed,
        aborted = summary.aborted,
        connections = stats.connections_accepted.load(std::sync::atomic::Ordering::Relaxed),
        keys = store_stats.keys,
        gets = store_stats.gets,
        sets = store_stats.sets,
        "Server shutdown complete"
    );
    Ok(())
}

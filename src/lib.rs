//! # Redline - A Minimal Key-Value Server
//!
//! Redline is a small in-memory key-value server speaking a subset of the
//! RESP wire protocol over TCP. Each connection carries exactly one
//! request and one reply.
//!
//! ## Features
//!
//! - **Line protocol**: CRLF-delimited requests, RESP-style replies
//! - **Concurrent store**: A single RwLock over a HashMap, shared by all connections
//! - **Duplicate policy**: `SET` can overwrite or reject existing keys
//! - **Async I/O**: Built on Tokio, one task per connection with graceful drain
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Redline                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   Server    │───>│ Connection  │───>│  Command    │                  │
//! │  │ (JoinSet)   │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │  ┌──────────────────────────┐                 ▼                         │
//! │  │ Protocol                 │    ┌────────────────────────────────┐     │
//! │  │  tokenize ─> parse ─>    │    │ MemoryStore                    │     │
//! │  │  Command ... RespValue   │    │  RwLock<HashMap<Bytes, Bytes>> │     │
//! │  └──────────────────────────┘    └────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use redline::{CommandHandler, MemoryStore, Server, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let handler = CommandHandler::new(Arc::new(MemoryStore::new()));
//!     let server = Server::bind(ServerConfig::default(), handler).await?;
//!
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `GET key`
//! - `SET key value`
//! - `DEL key [key ...]`
//!
//! ## Module Overview
//!
//! - [`protocol`]: Tokenizer, command parser and reply types
//! - [`storage`]: Thread-safe key-value store
//! - [`commands`]: Verb dispatch and reply construction
//! - [`connection`]: Single-exchange connection handling
//! - [`server`]: Accept loop and graceful shutdown
//! - [`config`]: Server configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::ServerConfig;
pub use connection::{handle_connection, ConnectionStats, RequestHandler};
pub use protocol::{decode_command, Command, RequestError, RespValue};
pub use server::{DrainSummary, Server};
pub use storage::{DataStore, DuplicatePolicy, MemoryStore};

/// The default port Redline listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host Redline binds to
pub const DEFAULT_HOST: &str = "localhost";

/// Version of Redline
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

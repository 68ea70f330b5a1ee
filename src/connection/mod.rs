//! Connection Handler Module
//!
//! This module manages individual client connections.
//! Each accepted socket is handled by its own async task and serves a single
//! request/response exchange.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (server.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ handle()    │───>│ Send reply  │     │
//! │  │ (deadline)  │    │ (decode+cmd)│    │             │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                           close socket      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Uses Tokio for non-blocking network operations
//! - **Bounded read**: One read into a fixed-capacity buffer, under a deadline
//! - **Keep-alive**: TCP keep-alive configured on every accepted socket
//! - **Statistics**: Tracks connection and exchange metrics
//!
//! ## Example
//!
//! ```ignore
//! use redline::connection::{handle_connection, ConnectionStats, ExchangeLimits};
//! use redline::commands::CommandHandler;
//! use redline::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! let handler = CommandHandler::new(Arc::new(MemoryStore::new()));
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler.clone(), ExchangeLimits::default(), stats));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{
    configure_socket, handle_connection, ConnectionError, ConnectionHandler, ConnectionStats,
    ExchangeLimits, ExchangeState, RequestHandler,
};

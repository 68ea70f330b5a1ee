//! Server configuration.
//!
//! Built from command-line arguments in `main`, or directly by embedders.

use crate::connection::ExchangeLimits;
use crate::storage::DuplicatePolicy;
use std::time::Duration;

/// Everything the server needs to bind and serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deadline for the single request read
    pub read_timeout: Duration,
    /// TCP keep-alive period for accepted sockets
    pub keepalive: Duration,
    /// Capacity of the request buffer
    pub buffer_size: usize,
    /// How long shutdown waits for in-flight exchanges
    pub drain_timeout: Duration,
    /// What SET does when the key already exists
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            read_timeout: Duration::from_secs(5),
            keepalive: Duration::from_secs(300),
            buffer_size: 4096,
            drain_timeout: Duration::from_secs(5),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The per-connection bounds derived from this configuration.
    pub fn exchange_limits(&self) -> ExchangeLimits {
        ExchangeLimits {
            read_timeout: self.read_timeout,
            buffer_size: self.buffer_size,
            keepalive: self.keepalive,
        }
    }
}

//! Command Handler Module
//!
//! This module executes parsed commands against the store and builds the
//! reply for each one.
//!
//! ## Supported Commands
//!
//! - `GET key` - Get a key's value
//! - `SET key value` - Set a key
//! - `DEL key [key ...]` - Delete keys
//!
//! ## Reply Rules
//!
//! Every command produces a reply. Missing arguments and store outcomes
//! (an absent key, a rejected duplicate) are encoded as reply values and
//! never end the exchange.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │  decode()   │───>│  dispatch() │───>│  serialize  │     │
//! │  └─────────────┘    └──────┬──────┘    └─────────────┘     │
//! │                            ▼                                │
//! │                      dyn DataStore                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::connection::RequestHandler;
use crate::protocol::{decode_command, Command, RequestError, RespValue};
use crate::storage::DataStore;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// The closed set of verbs the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Set,
    Del,
}

impl Verb {
    /// Resolves an upper-cased command name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(Verb::Get),
            "SET" => Some(Verb::Set),
            "DEL" => Some(Verb::Del),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Set => "SET",
            Verb::Del => "DEL",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes commands against an injected store.
#[derive(Clone)]
pub struct CommandHandler {
    /// The store shared by every connection
    storage: Arc<dyn DataStore>,
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandler").finish_non_exhaustive()
    }
}

impl CommandHandler {
    /// Creates a new command handler over the given store.
    pub fn new(storage: Arc<dyn DataStore>) -> Self {
        Self { storage }
    }

    /// Executes a command and returns the reply.
    ///
    /// # Example
    ///
    /// ```
    /// use redline::commands::CommandHandler;
    /// use redline::protocol::{Command, RespValue};
    /// use redline::storage::MemoryStore;
    /// use std::sync::Arc;
    ///
    /// let handler = CommandHandler::new(Arc::new(MemoryStore::new()));
    /// let reply = handler.execute(Command::new("get", vec!["missing".into()]));
    /// assert_eq!(reply, RespValue::null());
    /// ```
    pub fn execute(&self, command: Command) -> RespValue {
        let Command { name, params } = command;

        match Verb::from_name(&name) {
            Some(verb) => self.dispatch(verb, params),
            None => RespValue::error(format!("Unknown command {}", name)),
        }
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, verb: Verb, params: Vec<Bytes>) -> RespValue {
        match verb {
            Verb::Get => self.cmd_get(&params),
            Verb::Set => self.cmd_set(params),
            Verb::Del => self.cmd_del(&params),
        }
    }

    /// GET key
    fn cmd_get(&self, params: &[Bytes]) -> RespValue {
        let Some(key) = params.first() else {
            return RespValue::error("No key provided");
        };

        match self.storage.get(key) {
            Ok(value) => RespValue::simple_string(value),
            Err(_) => RespValue::null(),
        }
    }

    /// SET key value
    fn cmd_set(&self, params: Vec<Bytes>) -> RespValue {
        let mut params = params.into_iter();
        let (Some(key), Some(value)) = (params.next(), params.next()) else {
            return RespValue::error("A key value pair is required");
        };

        // `set` only fails when the duplicate policy refuses the key.
        match self.storage.set(key, value) {
            Ok(()) => RespValue::ok(),
            Err(e) => {
                trace!(error = %e, "SET rejected");
                RespValue::error("Key exists")
            }
        }
    }

    /// DEL key [key ...]
    fn cmd_del(&self, params: &[Bytes]) -> RespValue {
        if params.is_empty() {
            return RespValue::error("No keys provided");
        }

        let removed = self.storage.del(params);
        RespValue::integer(removed as i64)
    }
}

impl RequestHandler for CommandHandler {
    fn handle(&self, request: &[u8]) -> Result<Bytes, RequestError> {
        let command = decode_command(request)?;
        trace!(command = %command.name, params = command.params.len(), "Decoded command");

        Ok(self.execute(command).serialize())
    }
}

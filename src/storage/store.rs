//! Store Capability
//!
//! The dispatcher only ever talks to the store through [`DataStore`], so any
//! backend that honours the locking discipline below can be injected.
//!
//! ## Locking Discipline
//!
//! - `set` and `del` take exclusive access for the whole call
//! - `get` takes shared access
//!
//! Each call is one atomic store operation; nothing spans multiple calls.
//!
//! Keys and values are opaque bytes.

use bytes::Bytes;
use thiserror::Error;

/// Maximum number of key characters echoed back in error messages.
const KEY_DISPLAY_LIMIT: usize = 32;

/// Expected, named outcomes of store operations.
///
/// These are translated into replies by the dispatcher and never end an
/// exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `set` was refused because the key already exists. The key is kept
    /// as lossily decoded text for display.
    #[error("error setting key {}: duplicate key found", truncate(.key, KEY_DISPLAY_LIMIT))]
    KeyExists { key: String },

    /// `get` found no value for the key
    #[error("key not found")]
    KeyNotFound,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// What `set` does when the key is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Replace the old value
    #[default]
    Overwrite,
    /// Refuse the write with [`StoreError::KeyExists`] and keep the old value
    Reject,
}

/// Key-value operations available to the command dispatcher.
pub trait DataStore: Send + Sync {
    /// Inserts or overwrites `key`, subject to the store's duplicate policy.
    fn set(&self, key: Bytes, value: Bytes) -> StoreResult<()>;

    /// Returns the current value of `key`.
    fn get(&self, key: &[u8]) -> StoreResult<Bytes>;

    /// Removes every key in `keys` that exists and returns how many were removed.
    fn del(&self, keys: &[Bytes]) -> usize;
}

/// Shortens `s` to at most `max` characters, marking the cut with `..`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}..", &s[..idx]),
        None => s.to_string(),
    }
}

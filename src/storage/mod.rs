//! Storage Module
//!
//! This module provides the shared key-value store the dispatcher executes
//! commands against.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ CommandHandler                              │
//! │        │  Arc<dyn DataStore>                │
//! │        ▼                                    │
//! │ ┌───────────────────────────────────────┐   │
//! │ │ MemoryStore                           │   │
//! │ │   RwLock<HashMap<Bytes, Bytes>>       │   │
//! │ │   DuplicatePolicy: Overwrite | Reject │   │
//! │ └───────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **Duplicate rejection**: `set` can refuse to overwrite existing keys
//! - **Batch delete**: `del` removes many keys under one write lock
//!
//! ## Example
//!
//! ```
//! use redline::storage::{DataStore, DuplicatePolicy, MemoryStore, StoreError};
//!
//! let store = MemoryStore::with_policy(DuplicatePolicy::Reject);
//!
//! store.set("name".into(), "v1".into()).unwrap();
//! assert!(matches!(
//!     store.set("name".into(), "v2".into()),
//!     Err(StoreError::KeyExists { .. })
//! ));
//! assert_eq!(store.get(b"name").unwrap(), "v1");
//! ```

pub mod engine;
pub mod store;

// Re-export commonly used types
pub use engine::{MemoryStore, StorageStats};
pub use store::{DataStore, DuplicatePolicy, StoreError, StoreResult};

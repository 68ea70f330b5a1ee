//! Command Handler Module
//!
//! This module implements the command processing layer.
//! It receives parsed commands, executes them against the store,
//! and returns the encoded replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Tokenizer/Parser│  (protocol module)
//! └────────┬────────┘
//!          │ Command
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Resolve verb │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   DataStore     │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `GET`, `SET`, `DEL`

pub mod handler;

// Re-export the main command handler
pub use handler::{CommandHandler, Verb};

//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite for the append-only record store
//! - `sanitize`: patient-identifier filtering for logs

pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::{SqliteStorage, StorageError};

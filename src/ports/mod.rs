//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the risk engine and storage.

mod risk_engine;
mod storage;

pub use risk_engine::RiskEngine;
pub use storage::{RecordPage, Storage};

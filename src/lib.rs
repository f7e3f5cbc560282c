//! # cardiofuzzy
//!
//! Cardiovascular risk screening with a Mamdani fuzzy-inference engine.
//!
//! This crate provides:
//! - A pure, stateless fuzzy engine (fuzzification, rule bank, max
//!   aggregation, centroid defuzzification, result formatting)
//! - Validation of raw diagnosis requests before they reach the engine
//! - An append-only local record store with daily statistics
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (patient input, blood pressure, results)
//! - `engine`: The fuzzy-inference core
//! - `ports`: Trait definitions for the engine and storage seams
//! - `adapters`: Concrete implementations (SQLite, log sanitization)
//! - `application`: Use cases orchestrating domain, engine and ports

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod engine;
pub mod ports;

pub use domain::{DiagnosisLabel, DiagnosisRecord, DiagnosisResult, PatientInput, RiskTier};
pub use engine::{EngineConfig, FuzzyEngine};

/// Result type for cardiofuzzy operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for cardiofuzzy
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error("Invalid patient data: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Engine configuration error: {0}")]
    Config(#[from] engine::ConfigError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Record not found: {0}")]
    NotFound(String),
}

impl CardioError {
    /// Validation messages, if this is an input validation failure.
    #[must_use]
    pub fn validation_messages(&self) -> Option<&[String]> {
        match self {
            Self::Validation(messages) => Some(messages),
            _ => None,
        }
    }
}

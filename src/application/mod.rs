//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod diagnosis;
mod request;
mod statistics;

pub use diagnosis::{DiagnosisOutcome, DiagnosisService};
pub use request::{parse_symptoms, DiagnosisRequest};
pub use statistics::{DailyCount, StatisticsService, TierCount, WEEK_DAYS};

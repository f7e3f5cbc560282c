//! Risk engine port: Trait for cardiovascular risk assessment.
//!
//! Decouples the application services from the concrete fuzzy engine.

use crate::domain::PatientInput;
use crate::engine::Assessment;

/// Trait for risk assessment engines.
///
/// Implementations must be pure: the same patient always yields the same
/// assessment, and no state is carried between calls.
pub trait RiskEngine: Send + Sync {
    /// Assess a validated patient.
    fn assess(&self, patient: &PatientInput) -> Assessment;

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}

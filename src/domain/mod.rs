//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! All types are serializable and implement strict validation.

mod diagnosis;
mod patient;
pub mod pressure;

pub use diagnosis::{DiagnosisLabel, DiagnosisRecord, DiagnosisResult, RiskTier};
pub use patient::{
    body_mass_index, is_affirmative, normalize_token, BmiCategory, Gender, PatientInput,
    PsychologicalState, Symptom, SymptomAnswer, SymptomSet, DEFAULT_DIASTOLIC, DEFAULT_SYSTOLIC,
};
pub use pressure::{BloodPressureCategory, IdealPressure};

//! Diagnosis result types.
//!
//! Represents the output of the fuzzy risk assessment and the persisted
//! record built around it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BmiCategory, Gender, PatientInput, Symptom};

/// Risk tier derived from the defuzzified score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// No meaningful indicators
    VeryLow,
    /// Some indicators, preventive care recommended
    Low,
    /// Follow-up with a specialist recommended
    Medium,
    /// Urgent medical attention advised
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [Self::VeryLow, Self::Low, Self::Medium, Self::High];

    /// Stable identifier used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Convert a stored identifier back into a tier.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "very_low" => Self::VeryLow,
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VeryLow => write!(f, "Very Low"),
            Self::Low => write!(f, "Low Risk"),
            Self::Medium => write!(f, "Medium Risk"),
            Self::High => write!(f, "High Risk"),
        }
    }
}

/// Headline diagnosis shown to the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisLabel {
    NotDetected,
    PotentialHeartProblem,
}

impl DiagnosisLabel {
    #[must_use]
    pub fn for_tier(tier: RiskTier) -> Self {
        match tier {
            RiskTier::VeryLow => Self::NotDetected,
            _ => Self::PotentialHeartProblem,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotDetected => "not_detected",
            Self::PotentialHeartProblem => "potential_heart_problem",
        }
    }

    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "not_detected" => Self::NotDetected,
            _ => Self::PotentialHeartProblem,
        }
    }
}

impl fmt::Display for DiagnosisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetected => write!(f, "Not Detected"),
            Self::PotentialHeartProblem => write!(f, "Potential Heart Problem Detected"),
        }
    }
}

/// Formatted outcome of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Centroid score in [0, 100], rounded to 2 decimals
    pub score: f64,

    pub diagnosis: DiagnosisLabel,

    pub risk_tier: RiskTier,

    /// Advice text for the tier
    pub advice: String,

    /// Risk factors found in the patient profile
    pub risk_factors: Vec<String>,

    /// At most five concrete recommendations
    pub recommendations: Vec<String>,
}

/// Complete diagnosis record including metadata, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    /// Unique identifier
    pub id: String,

    pub patient_name: String,

    pub age: u32,

    pub gender: Gender,

    pub weight_kg: f64,

    /// Height as entered on the form, in centimeters
    pub height_cm: f64,

    pub bmi: f64,

    pub bmi_category: BmiCategory,

    /// Symptoms answered "yes"
    pub active_symptoms: Vec<Symptom>,

    pub result: DiagnosisResult,

    /// Timestamp of diagnosis
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl DiagnosisRecord {
    /// Create a new record for a patient and their result.
    #[must_use]
    pub fn new(patient_name: impl Into<String>, patient: &PatientInput, result: DiagnosisResult) -> Self {
        Self {
            id: uuid_v4(),
            patient_name: patient_name.into(),
            age: patient.age,
            gender: patient.gender,
            weight_kg: patient.weight_kg,
            height_cm: (patient.height_m * 10_000.0).round() / 100.0,
            bmi: patient.bmi(),
            bmi_category: patient.bmi_category(),
            active_symptoms: patient.symptoms.present(),
            result,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Generate a random UUID v4 using a CSPRNG.
///
/// Record ids are exposed to callers, so they must not be guessable.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymptomAnswer;

    fn sample_result() -> DiagnosisResult {
        DiagnosisResult {
            score: 28.15,
            diagnosis: DiagnosisLabel::PotentialHeartProblem,
            risk_tier: RiskTier::Low,
            advice: "Schedule a check-up".to_string(),
            risk_factors: vec!["Smoking".to_string()],
            recommendations: vec![],
        }
    }

    #[test]
    fn test_label_for_tier() {
        assert_eq!(DiagnosisLabel::for_tier(RiskTier::VeryLow), DiagnosisLabel::NotDetected);
        assert_eq!(
            DiagnosisLabel::for_tier(RiskTier::High),
            DiagnosisLabel::PotentialHeartProblem
        );
        assert_eq!(DiagnosisLabel::NotDetected.to_string(), "Not Detected");
    }

    #[test]
    fn test_tier_storage_roundtrip() {
        for tier in RiskTier::ALL {
            assert_eq!(RiskTier::from_str_lossy(tier.as_str()), tier);
        }
        assert_eq!(RiskTier::High.to_string(), "High Risk");
    }

    #[test]
    fn test_record_creation() {
        let patient = PatientInput::new(52, Gender::Female, 68.0, 1.6).with_symptoms(
            crate::domain::SymptomSet::new()
                .with(Symptom::Fatigue, SymptomAnswer::Yes)
                .with(Symptom::Dizziness, SymptomAnswer::No),
        );
        let record = DiagnosisRecord::new("Siti", &patient, sample_result());

        assert_eq!(record.patient_name, "Siti");
        assert!((record.height_cm - 160.0).abs() < 1e-9);
        assert!((record.bmi - 26.56).abs() < 1e-9);
        assert_eq!(record.bmi_category, BmiCategory::Overweight);
        assert_eq!(record.active_symptoms, vec![Symptom::Fatigue]);
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }
}

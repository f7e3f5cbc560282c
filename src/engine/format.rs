//! Result formatting: score bands, advice, risk factors and recommendations.

use std::fmt;

use serde::Serialize;

use super::config::EngineConfig;
use super::fuzzify::Antecedents;
use crate::domain::{
    BloodPressureCategory, BmiCategory, DiagnosisLabel, DiagnosisResult, PatientInput,
    PsychologicalState, RiskTier,
};

/// Recommendations carried by one result.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Elderly membership above which age counts as a risk factor.
const ELDERLY_FACTOR_THRESHOLD: f64 = 0.5;

/// Risk factor present in a patient profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    AdvancedAge,
    Underweight,
    Overweight,
    Obesity,
    LowPressure,
    ElevatedPressure,
    Hypertension,
    Smoking,
    DiseaseHistory,
    PsychologicalDistress,
}

impl RiskFactor {
    #[must_use]
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::AdvancedAge => "Have a cardiovascular check-up at least once a year",
            Self::Underweight => "Discuss a nutrition plan to reach a healthy weight",
            Self::Overweight | Self::Obesity => {
                "Aim for gradual weight loss through diet and regular activity"
            }
            Self::LowPressure => "Stay hydrated and report dizziness or fainting to a doctor",
            Self::ElevatedPressure => "Limit salt intake and recheck blood pressure within a month",
            Self::Hypertension => "Monitor blood pressure daily and discuss treatment with a doctor",
            Self::Smoking => "Stop smoking; ask a clinic about cessation support",
            Self::DiseaseHistory => "Keep regular follow-up with your cardiologist",
            Self::PsychologicalDistress => {
                "Seek support for stress or mood from a counsellor or psychologist"
            }
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AdvancedAge => "Advanced age",
            Self::Underweight => "Underweight",
            Self::Overweight => "Overweight",
            Self::Obesity => "Obesity",
            Self::LowPressure => "Low blood pressure",
            Self::ElevatedPressure => "Elevated blood pressure",
            Self::Hypertension => "Hypertension",
            Self::Smoking => "Smoking",
            Self::DiseaseHistory => "History of heart disease",
            Self::PsychologicalDistress => "Psychological distress",
        };
        f.write_str(label)
    }
}

/// Risk factors of `patient`, most clinically relevant first.
#[must_use]
pub fn risk_factors(patient: &PatientInput, antecedents: &Antecedents) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if patient.disease_history {
        factors.push(RiskFactor::DiseaseHistory);
    }
    match antecedents.pressure.category {
        category if category.is_hypertensive() => factors.push(RiskFactor::Hypertension),
        BloodPressureCategory::Prehypertension => factors.push(RiskFactor::ElevatedPressure),
        BloodPressureCategory::Hypotension => factors.push(RiskFactor::LowPressure),
        _ => {}
    }
    if patient.smoker {
        factors.push(RiskFactor::Smoking);
    }
    if antecedents.age.elderly > ELDERLY_FACTOR_THRESHOLD {
        factors.push(RiskFactor::AdvancedAge);
    }
    match patient.bmi_category() {
        BmiCategory::Underweight => factors.push(RiskFactor::Underweight),
        BmiCategory::Overweight => factors.push(RiskFactor::Overweight),
        BmiCategory::Obese => factors.push(RiskFactor::Obesity),
        BmiCategory::Normal => {}
    }
    if antecedents.psych.is_distressed()
        || patient.psychological_state == PsychologicalState::SuicidalTendency
    {
        factors.push(RiskFactor::PsychologicalDistress);
    }

    factors
}

fn tier_recommendations(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::VeryLow => &["Keep up regular exercise and a balanced diet"],
        RiskTier::Low => &["Schedule a routine heart check-up within 3-6 months"],
        RiskTier::Medium => &[
            "See a cardiologist within 1-2 weeks",
            "Ask about an ECG or echocardiogram",
        ],
        RiskTier::High => &[
            "Seek emergency care or a cardiologist within 24-48 hours",
            "Avoid strenuous activity until you have been examined",
        ],
    }
}

/// Tier-specific advice first, then one entry per risk factor, deduplicated
/// and capped at [`MAX_RECOMMENDATIONS`].
#[must_use]
pub fn recommendations(tier: RiskTier, factors: &[RiskFactor]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_RECOMMENDATIONS);
    let candidates = tier_recommendations(tier)
        .iter()
        .copied()
        .chain(factors.iter().map(RiskFactor::recommendation));

    for text in candidates {
        if out.len() == MAX_RECOMMENDATIONS {
            break;
        }
        if !out.iter().any(|existing| existing == text) {
            out.push(text.to_string());
        }
    }
    out
}

/// Round to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build the final result from a raw centroid score.
///
/// The tier is taken from the unrounded score so rounding can never move a
/// result across a band edge.
#[must_use]
pub fn format_result(
    raw_score: f64,
    patient: &PatientInput,
    antecedents: &Antecedents,
    config: &EngineConfig,
) -> DiagnosisResult {
    let risk_tier = config.bands.tier(raw_score);
    let factors = risk_factors(patient, antecedents);

    DiagnosisResult {
        score: round2(raw_score),
        diagnosis: DiagnosisLabel::for_tier(risk_tier),
        risk_tier,
        advice: config.advice.for_tier(risk_tier).to_string(),
        risk_factors: factors.iter().map(ToString::to_string).collect(),
        recommendations: recommendations(risk_tier, &factors),
    }
}

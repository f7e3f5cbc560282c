//! Engine parameter tables.
//!
//! All membership parameters, symptom weights, stress profiles, rule
//! constants, score bands and advice texts live in one immutable
//! [`EngineConfig`]. It is built once at startup (defaults, or a JSON file
//! overriding any subset) and handed to the engine explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::membership::Curve;
use crate::domain::{PsychologicalState, RiskTier, Symptom};

/// Environment variable naming an optional JSON parameter file.
pub const ENGINE_CONFIG_ENV: &str = "CARDIOFUZZY_ENGINE_CONFIG";

/// Errors for degenerate or unreadable engine configuration.
///
/// These are startup failures; user input can never trigger them.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Degenerate membership curve '{term}': std must be positive and finite, got {std}")]
    DegenerateCurve { term: String, std: f64 },

    #[error("Non-finite parameter: {0}")]
    NonFinite(String),

    #[error("Value for '{term}' must lie in [0, 1], got {value}")]
    OutOfUnitRange { term: String, value: f64 },

    #[error("Score bands must be strictly ascending within (0, 100]: {0}")]
    InvalidBands(String),

    #[error("Failed to read engine configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid engine configuration format: {0}")]
    Parse(#[from] serde_json::Error),
}

fn check_unit(term: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange {
            term: term.to_string(),
            value,
        })
    }
}

/// Age terms (years).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeTerms {
    pub infant: Curve,
    pub child: Curve,
    pub adolescent: Curve,
    pub adult: Curve,
    pub elderly: Curve,
}

impl Default for AgeTerms {
    fn default() -> Self {
        Self {
            infant: Curve::gaussian(2.5, 2.0),
            child: Curve::gaussian(7.0, 2.0),
            adolescent: Curve::gaussian(14.0, 4.0),
            adult: Curve::gaussian(39.0, 15.0),
            elderly: Curve::gaussian(70.0, 10.0),
        }
    }
}

/// BMI terms (kg/m²), anchored near the WHO band midpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BmiTerms {
    pub underweight: Curve,
    pub normal: Curve,
    pub overweight: Curve,
    pub obese: Curve,
}

impl Default for BmiTerms {
    fn default() -> Self {
        Self {
            underweight: Curve::gaussian(16.5, 2.0),
            normal: Curve::gaussian(21.75, 3.0),
            overweight: Curve::gaussian(27.5, 2.5),
            obese: Curve::gaussian(35.0, 5.0),
        }
    }
}

/// Terms over the pressure deviation score (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureTerms {
    pub low: Curve,
    pub normal: Curve,
    pub high: Curve,
    pub very_high: Curve,
}

impl Default for PressureTerms {
    fn default() -> Self {
        Self {
            low: Curve::left_shoulder(-20.0, 10.0),
            normal: Curve::gaussian(0.0, 10.0),
            high: Curve::gaussian(25.0, 15.0),
            very_high: Curve::right_shoulder(50.0, 20.0),
        }
    }
}

/// Clinical severity weight per symptom, in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomWeights {
    pub chest_pain: f64,
    pub shortness_of_breath: f64,
    pub palpitations: f64,
    pub cold_sweat: f64,
    pub leg_swelling: f64,
    pub fatigue: f64,
    pub weakness: f64,
    pub dizziness: f64,
}

impl Default for SymptomWeights {
    fn default() -> Self {
        Self {
            chest_pain: 1.0,
            shortness_of_breath: 1.0,
            palpitations: 0.95,
            cold_sweat: 0.95,
            leg_swelling: 0.8,
            fatigue: 0.7,
            weakness: 0.5,
            dizziness: 0.4,
        }
    }
}

impl SymptomWeights {
    #[must_use]
    pub fn weight(&self, symptom: Symptom) -> f64 {
        match symptom {
            Symptom::ChestPain => self.chest_pain,
            Symptom::ShortnessOfBreath => self.shortness_of_breath,
            Symptom::Palpitations => self.palpitations,
            Symptom::ColdSweat => self.cold_sweat,
            Symptom::LegSwelling => self.leg_swelling,
            Symptom::Fatigue => self.fatigue,
            Symptom::Weakness => self.weakness,
            Symptom::Dizziness => self.dizziness,
        }
    }
}

/// (low, medium, high) stress membership for one psychological state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StressProfile {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl StressProfile {
    #[must_use]
    pub const fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }
}

/// Stress profile per recognized psychological state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsychologyTable {
    pub calm: StressProfile,
    pub fear: StressProfile,
    pub anger: StressProfile,
    pub depression: StressProfile,
    pub anxiety: StressProfile,
    pub suicidal_tendency: StressProfile,
}

impl Default for PsychologyTable {
    fn default() -> Self {
        Self {
            calm: StressProfile::new(1.0, 0.0, 0.0),
            fear: StressProfile::new(0.2, 0.8, 0.3),
            anger: StressProfile::new(0.2, 0.7, 0.5),
            depression: StressProfile::new(0.0, 0.5, 0.8),
            anxiety: StressProfile::new(0.1, 0.8, 0.4),
            suicidal_tendency: StressProfile::new(0.0, 0.2, 1.0),
        }
    }
}

impl PsychologyTable {
    /// Profile for `state`; unrecognized states get all zeros.
    #[must_use]
    pub fn profile(&self, state: PsychologicalState) -> StressProfile {
        match state {
            PsychologicalState::Calm => self.calm,
            PsychologicalState::Fear => self.fear,
            PsychologicalState::Anger => self.anger,
            PsychologicalState::Depression => self.depression,
            PsychologicalState::Anxiety => self.anxiety,
            PsychologicalState::SuicidalTendency => self.suicidal_tendency,
            PsychologicalState::Unrecognized => StressProfile::default(),
        }
    }

    fn entries(&self) -> [(&'static str, StressProfile); 6] {
        [
            ("calm", self.calm),
            ("fear", self.fear),
            ("anger", self.anger),
            ("depression", self.depression),
            ("anxiety", self.anxiety),
            ("suicidal_tendency", self.suicidal_tendency),
        ]
    }
}

/// Constants governing rule activation and the fallback policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Rules at or below this strength do not fire
    pub min_activation: f64,
    /// Low-risk strength when symptoms are present but no rule fired
    pub fallback_strength: f64,
    /// Low-risk strength for symptom-free patients with residual risk factors
    pub residual_risk_strength: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_activation: 0.1,
            fallback_strength: 0.3,
            residual_risk_strength: 0.3,
        }
    }
}

/// Output terms over the 0-100 risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputTerms {
    pub low: Curve,
    pub medium: Curve,
    pub high: Curve,
}

impl Default for OutputTerms {
    fn default() -> Self {
        Self {
            low: Curve::gaussian(25.0, 15.0),
            medium: Curve::gaussian(55.0, 15.0),
            high: Curve::gaussian(85.0, 10.0),
        }
    }
}

/// Ascending score cut points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBands {
    /// Scores below this are "not detected"
    pub not_detected_below: f64,
    pub low_below: f64,
    pub medium_below: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            not_detected_below: 15.0,
            low_below: 40.0,
            medium_below: 70.0,
        }
    }
}

impl ScoreBands {
    #[must_use]
    pub fn tier(&self, score: f64) -> RiskTier {
        if score < self.not_detected_below {
            RiskTier::VeryLow
        } else if score < self.low_below {
            RiskTier::Low
        } else if score < self.medium_below {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

/// Advice text per risk tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceTexts {
    pub very_low: String,
    pub low: String,
    pub medium: String,
    pub high: String,
}

impl Default for AdviceTexts {
    fn default() -> Self {
        Self {
            very_low: [
                "Your heart appears to be in good condition. Keep up a healthy lifestyle:",
                "- Exercise 30 minutes a day (walking, cycling or swimming)",
                "- Eat a balanced diet with plenty of vegetables and fruit",
                "- Sleep 7-8 hours a night",
                "- Avoid smoking and excessive alcohol",
                "- Manage stress with activities you enjoy",
                "Tip: a yearly medical check-up helps keep it that way.",
            ]
            .join("\n"),
            low: [
                "Early detection: a few indicators deserve attention, but there is no need to worry.",
                "Preventive steps:",
                "- Start light exercise 3 times a week (20-30 minutes of brisk walking)",
                "- Eat more omega-3 sources such as fish, nuts and avocado",
                "- Cut down on salt and processed food",
                "- Monitor blood pressure and cholesterol regularly",
                "- Schedule a heart check-up within the next 3-6 months",
            ]
            .join("\n"),
            medium: [
                "Attention: your condition needs prompt medical follow-up.",
                "Do this soon:",
                "- See a cardiologist within 1-2 weeks",
                "- Have an ECG, echocardiogram or stress test as advised",
                "- Take prescribed medication consistently",
                "Lifestyle changes:",
                "- Stop smoking now",
                "- Follow a heart-healthy diet low in saturated fat and high in fiber",
                "- Lose excess weight gradually (0.5-1 kg per week)",
                "- Manage stress with relaxation techniques or counselling",
            ]
            .join("\n"),
            high: [
                "URGENT: immediate action is needed.",
                "Within the next 24-48 hours:",
                "- Go to an emergency department or a cardiologist",
                "- Keep emergency numbers on your phone",
                "- Tell your family about your condition",
                "- Bring your complete medical history to the doctor",
                "Until you are seen:",
                "- Take prescribed medication strictly",
                "- Stop smoking and alcohol completely",
                "- Avoid strenuous physical activity",
                "- Monitor blood pressure and pulse daily",
                "- Keep a strict low-salt, low-fat diet",
            ]
            .join("\n"),
        }
    }
}

impl AdviceTexts {
    #[must_use]
    pub fn for_tier(&self, tier: RiskTier) -> &str {
        match tier {
            RiskTier::VeryLow => &self.very_low,
            RiskTier::Low => &self.low,
            RiskTier::Medium => &self.medium,
            RiskTier::High => &self.high,
        }
    }
}

/// Complete, immutable parameter set for the fuzzy engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub age: AgeTerms,
    pub bmi: BmiTerms,
    pub pressure: PressureTerms,
    pub symptom_weights: SymptomWeights,
    pub psychology: PsychologyTable,
    pub rules: RuleConfig,
    pub output: OutputTerms,
    pub bands: ScoreBands,
    pub advice: AdviceTexts,
}

impl EngineConfig {
    /// Load a JSON parameter file. Missing sections keep their defaults.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::info!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to the built-in tables.
    ///
    /// # Errors
    /// Returns error if the given file is unusable.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                tracing::debug!("Using built-in engine configuration");
                Ok(Self::default())
            }
        }
    }

    /// Check every parameter for degenerate values.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let curves = [
            ("age.infant", &self.age.infant),
            ("age.child", &self.age.child),
            ("age.adolescent", &self.age.adolescent),
            ("age.adult", &self.age.adult),
            ("age.elderly", &self.age.elderly),
            ("bmi.underweight", &self.bmi.underweight),
            ("bmi.normal", &self.bmi.normal),
            ("bmi.overweight", &self.bmi.overweight),
            ("bmi.obese", &self.bmi.obese),
            ("pressure.low", &self.pressure.low),
            ("pressure.normal", &self.pressure.normal),
            ("pressure.high", &self.pressure.high),
            ("pressure.very_high", &self.pressure.very_high),
            ("output.low", &self.output.low),
            ("output.medium", &self.output.medium),
            ("output.high", &self.output.high),
        ];
        for (term, curve) in curves {
            curve.validate(term)?;
        }

        for symptom in Symptom::ALL {
            let term = format!("symptom_weights.{}", symptom.name());
            check_unit(&term, self.symptom_weights.weight(symptom))?;
        }

        for (state, profile) in self.psychology.entries() {
            check_unit(&format!("psychology.{state}.low"), profile.low)?;
            check_unit(&format!("psychology.{state}.medium"), profile.medium)?;
            check_unit(&format!("psychology.{state}.high"), profile.high)?;
        }

        check_unit("rules.min_activation", self.rules.min_activation)?;
        check_unit("rules.fallback_strength", self.rules.fallback_strength)?;
        check_unit("rules.residual_risk_strength", self.rules.residual_risk_strength)?;

        let bands = &self.bands;
        let ascending = 0.0 < bands.not_detected_below
            && bands.not_detected_below < bands.low_below
            && bands.low_below < bands.medium_below
            && bands.medium_below <= 100.0;
        if !ascending {
            return Err(ConfigError::InvalidBands(format!(
                "{} / {} / {}",
                bands.not_detected_below, bands.low_below, bands.medium_below
            )));
        }

        Ok(())
    }
}

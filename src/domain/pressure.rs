//! Blood pressure reference values and clinical classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Gender;

/// Age- and gender-specific ideal pressure (mmHg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl IdealPressure {
    const fn new(systolic: f64, diastolic: f64) -> Self {
        Self {
            systolic,
            diastolic,
        }
    }
}

/// Ideal baseline used as the reference for the deviation score.
///
/// Under-18s share a single pediatric baseline regardless of gender.
#[must_use]
pub fn ideal_pressure(age: u32, gender: Gender) -> IdealPressure {
    if age < 18 {
        return IdealPressure::new(110.0, 70.0);
    }
    match (gender, age) {
        (Gender::Female, 18..=39) => IdealPressure::new(110.0, 68.0),
        (Gender::Female, 40..=59) => IdealPressure::new(122.0, 74.0),
        (Gender::Female, _) => IdealPressure::new(139.0, 68.0),
        (Gender::Male, 18..=39) => IdealPressure::new(119.0, 70.0),
        (Gender::Male, 40..=59) => IdealPressure::new(124.0, 77.0),
        (Gender::Male, _) => IdealPressure::new(133.0, 69.0),
    }
}

/// Weighted percentage deviation from the ideal baseline:
/// `0.6 * systolic% + 0.4 * diastolic%`.
///
/// Zero means "exactly ideal"; negative values indicate low pressure.
#[must_use]
pub fn deviation_score(systolic: f64, diastolic: f64, age: u32, gender: Gender) -> f64 {
    let ideal = ideal_pressure(age, gender);
    let systolic_dev = (systolic - ideal.systolic) / ideal.systolic * 100.0;
    let diastolic_dev = (diastolic - ideal.diastolic) / ideal.diastolic * 100.0;
    0.6 * systolic_dev + 0.4 * diastolic_dev
}

/// Clinical blood pressure category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodPressureCategory {
    /// Systolic < 90 or diastolic < 60
    Hypotension,
    /// 90-120 / 60-80
    #[default]
    Normal,
    /// 121-139 or 81-89
    Prehypertension,
    /// 140-159 or 90-99
    HypertensionStage1,
    /// 160-179 or 100-109
    HypertensionStage2,
    /// ≥ 180 or ≥ 110
    HypertensiveEmergency,
}

impl BloodPressureCategory {
    /// Classify a reading. The most severe matching band wins.
    #[must_use]
    pub fn classify(systolic: f64, diastolic: f64) -> Self {
        if systolic >= 180.0 || diastolic >= 110.0 {
            Self::HypertensiveEmergency
        } else if systolic >= 160.0 || diastolic >= 100.0 {
            Self::HypertensionStage2
        } else if systolic >= 140.0 || diastolic >= 90.0 {
            Self::HypertensionStage1
        } else if systolic > 120.0 || diastolic > 80.0 {
            Self::Prehypertension
        } else if systolic >= 90.0 && diastolic >= 60.0 {
            Self::Normal
        } else {
            Self::Hypotension
        }
    }

    /// Prehypertension or worse.
    #[must_use]
    pub fn is_above_normal(&self) -> bool {
        matches!(self, Self::Prehypertension) || self.is_hypertensive()
    }

    #[must_use]
    pub fn is_hypertensive(&self) -> bool {
        matches!(
            self,
            Self::HypertensionStage1 | Self::HypertensionStage2 | Self::HypertensiveEmergency
        )
    }
}

impl fmt::Display for BloodPressureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Hypotension => "Hypotension",
            Self::Normal => "Normal",
            Self::Prehypertension => "Prehypertension",
            Self::HypertensionStage1 => "Hypertension stage 1",
            Self::HypertensionStage2 => "Hypertension stage 2",
            Self::HypertensiveEmergency => "Hypertensive emergency",
        };
        f.write_str(label)
    }
}

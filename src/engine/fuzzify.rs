//! Fuzzification: crisp patient attributes to membership degrees.

use serde::Serialize;

use super::config::EngineConfig;
use crate::domain::pressure::{deviation_score, BloodPressureCategory};
use crate::domain::{PatientInput, Symptom};

/// Degrees at or above this count as psychological distress.
pub const DISTRESS_THRESHOLD: f64 = 0.5;

/// Age-group memberships. Overlapping, not normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AgeMembership {
    pub infant: f64,
    pub child: f64,
    pub adolescent: f64,
    pub adult: f64,
    pub elderly: f64,
}

impl AgeMembership {
    #[must_use]
    pub fn degrees(&self) -> [(&'static str, f64); 5] {
        [
            ("infant", self.infant),
            ("child", self.child),
            ("adolescent", self.adolescent),
            ("adult", self.adult),
            ("elderly", self.elderly),
        ]
    }

    /// Neither adult nor elderly dominates, and the patient sits on the
    /// young side of the age axis.
    #[must_use]
    pub fn is_young(&self) -> bool {
        let youth = self.infant.max(self.child).max(self.adolescent);
        self.adult < 0.5 && self.elderly < 0.5 && youth > self.elderly
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BmiMembership {
    pub underweight: f64,
    pub normal: f64,
    pub overweight: f64,
    pub obese: f64,
}

impl BmiMembership {
    #[must_use]
    pub fn degrees(&self) -> [(&'static str, f64); 4] {
        [
            ("underweight", self.underweight),
            ("normal", self.normal),
            ("overweight", self.overweight),
            ("obese", self.obese),
        ]
    }

    /// Stronger of the two excess-weight terms.
    #[must_use]
    pub fn excess(&self) -> f64 {
        self.overweight.max(self.obese)
    }
}

/// Pressure memberships over the deviation score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PressureMembership {
    /// Deviation score the terms were evaluated at
    pub score: f64,
    pub low: f64,
    pub normal: f64,
    pub high: f64,
    pub very_high: f64,
    /// Clinical band of the raw reading
    pub category: BloodPressureCategory,
}

impl PressureMembership {
    #[must_use]
    pub fn degrees(&self) -> [(&'static str, f64); 4] {
        [
            ("low", self.low),
            ("normal", self.normal),
            ("high", self.high),
            ("very_high", self.very_high),
        ]
    }

    /// Elevated pressure: max(high, very high).
    #[must_use]
    pub fn elevated(&self) -> f64 {
        self.high.max(self.very_high)
    }

    /// Elevated relative to the baseline and above the normal clinical band.
    #[must_use]
    pub fn is_risk_factor(&self) -> bool {
        self.elevated() > 0.5 && self.category.is_above_normal()
    }
}

/// Binary history memberships.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HistoryMembership {
    pub disease: f64,
    pub smoking: f64,
}

impl HistoryMembership {
    #[must_use]
    pub fn degrees(&self) -> [(&'static str, f64); 2] {
        [("disease", self.disease), ("smoking", self.smoking)]
    }
}

/// Stress memberships looked up from the psychological state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PsychMembership {
    pub low_stress: f64,
    pub medium_stress: f64,
    pub high_stress: f64,
}

impl PsychMembership {
    #[must_use]
    pub fn degrees(&self) -> [(&'static str, f64); 3] {
        [
            ("low_stress", self.low_stress),
            ("medium_stress", self.medium_stress),
            ("high_stress", self.high_stress),
        ]
    }

    #[must_use]
    pub fn distress(&self) -> f64 {
        self.medium_stress.max(self.high_stress)
    }

    #[must_use]
    pub fn is_distressed(&self) -> bool {
        self.distress() >= DISTRESS_THRESHOLD
    }
}

/// Base (0/1) and weighted symptom memberships, indexed by [`Symptom::index`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SymptomMembership {
    pub base: [f64; Symptom::COUNT],
    pub weighted: [f64; Symptom::COUNT],
}

impl SymptomMembership {
    /// Weighted degree of one symptom.
    #[must_use]
    pub fn get(&self, symptom: Symptom) -> f64 {
        self.weighted[symptom.index()]
    }

    #[must_use]
    pub fn is_present(&self, symptom: Symptom) -> bool {
        self.base[symptom.index()] > 0.0
    }

    /// Chest pain or shortness of breath.
    #[must_use]
    pub fn major(&self) -> f64 {
        self.get(Symptom::ChestPain)
            .max(self.get(Symptom::ShortnessOfBreath))
    }

    #[must_use]
    pub fn minor(&self) -> f64 {
        [
            Symptom::Palpitations,
            Symptom::ColdSweat,
            Symptom::LegSwelling,
            Symptom::Fatigue,
        ]
        .into_iter()
        .map(|s| self.get(s))
        .fold(0.0, f64::max)
    }

    /// Weakness or dizziness.
    #[must_use]
    pub fn non_specific(&self) -> f64 {
        self.get(Symptom::Weakness).max(self.get(Symptom::Dizziness))
    }

    /// Number of symptoms answered "yes".
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.base.iter().filter(|b| **b > 0.0).count()
    }

    #[must_use]
    pub fn degrees(&self) -> Vec<(&'static str, f64)> {
        Symptom::ALL
            .into_iter()
            .map(|s| (s.name(), self.get(s)))
            .collect()
    }
}

/// Every membership vector for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Antecedents {
    pub age: AgeMembership,
    pub bmi: BmiMembership,
    pub pressure: PressureMembership,
    pub history: HistoryMembership,
    pub psych: PsychMembership,
    pub symptoms: SymptomMembership,
}

impl Antecedents {
    /// Fuzzify every dimension of `patient`.
    #[must_use]
    pub fn from_patient(patient: &PatientInput, config: &EngineConfig) -> Self {
        Self {
            age: fuzzify_age(patient.age, config),
            bmi: fuzzify_bmi(patient.bmi(), config),
            pressure: fuzzify_pressure(patient, config),
            history: HistoryMembership {
                disease: binary(patient.disease_history),
                smoking: binary(patient.smoker),
            },
            psych: fuzzify_psych(patient, config),
            symptoms: fuzzify_symptoms(patient, config),
        }
    }

    /// Any history, distress or risk-factor signal independent of symptoms.
    #[must_use]
    pub fn has_history_or_distress(&self) -> bool {
        self.history.disease > 0.0 || self.history.smoking > 0.0 || self.psych.is_distressed()
    }

    /// Residual risk for a symptom-free patient.
    #[must_use]
    pub fn has_residual_risk(&self) -> bool {
        self.has_history_or_distress() || self.pressure.is_risk_factor()
    }
}

fn binary(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

#[must_use]
pub fn fuzzify_age(age: u32, config: &EngineConfig) -> AgeMembership {
    let x = f64::from(age);
    let terms = &config.age;
    AgeMembership {
        infant: terms.infant.evaluate(x),
        child: terms.child.evaluate(x),
        adolescent: terms.adolescent.evaluate(x),
        adult: terms.adult.evaluate(x),
        elderly: terms.elderly.evaluate(x),
    }
}

#[must_use]
pub fn fuzzify_bmi(bmi: f64, config: &EngineConfig) -> BmiMembership {
    let terms = &config.bmi;
    BmiMembership {
        underweight: terms.underweight.evaluate(bmi),
        normal: terms.normal.evaluate(bmi),
        overweight: terms.overweight.evaluate(bmi),
        obese: terms.obese.evaluate(bmi),
    }
}

/// Fuzzify the age- and gender-adjusted pressure deviation score.
#[must_use]
pub fn fuzzify_pressure(patient: &PatientInput, config: &EngineConfig) -> PressureMembership {
    let score = deviation_score(patient.systolic, patient.diastolic, patient.age, patient.gender);
    let terms = &config.pressure;
    PressureMembership {
        score,
        low: terms.low.evaluate(score),
        normal: terms.normal.evaluate(score),
        high: terms.high.evaluate(score),
        very_high: terms.very_high.evaluate(score),
        category: BloodPressureCategory::classify(patient.systolic, patient.diastolic),
    }
}

#[must_use]
pub fn fuzzify_psych(patient: &PatientInput, config: &EngineConfig) -> PsychMembership {
    let profile = config.psychology.profile(patient.psychological_state);
    PsychMembership {
        low_stress: profile.low,
        medium_stress: profile.medium,
        high_stress: profile.high,
    }
}

#[must_use]
pub fn fuzzify_symptoms(patient: &PatientInput, config: &EngineConfig) -> SymptomMembership {
    let mut membership = SymptomMembership::default();
    for symptom in Symptom::ALL {
        let base = binary(patient.symptoms.is_present(symptom));
        membership.base[symptom.index()] = base;
        membership.weighted[symptom.index()] = base * config.symptom_weights.weight(symptom);
    }
    membership
}

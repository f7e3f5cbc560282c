//! The fuzzy rule bank.
//!
//! Each rule is a pure function of the [`Antecedents`] returning the
//! strength it fires with, or `None` when its guard does not hold.
//! Conjunction is `min`, disjunction is `max`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::RuleConfig;
use super::fuzzify::Antecedents;
use crate::domain::Symptom;

/// Output category a rule concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    /// Sentinel for a symptom-free, factor-free patient
    NotDetected,
}

impl RiskCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::NotDetected => "not_detected",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule that fired, with its strength in (min_activation, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleFiring {
    pub rule: &'static str,
    pub category: RiskCategory,
    pub strength: f64,
}

/// One named rule of the bank.
pub struct Rule {
    pub name: &'static str,
    pub category: RiskCategory,
    pub description: &'static str,
    evaluate: fn(&Antecedents) -> Option<f64>,
}

impl Rule {
    /// Strength this rule fires with, if its guard holds.
    #[must_use]
    pub fn evaluate(&self, antecedents: &Antecedents) -> Option<f64> {
        (self.evaluate)(antecedents)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

fn when(guard: bool, strength: impl FnOnce() -> f64) -> Option<f64> {
    guard.then(strength)
}

/// Name used for the default emitted when no symptom is active.
pub const NO_SYMPTOMS_RULE: &str = "no_active_symptoms";
/// Name used for the default emitted when symptoms fired nothing.
pub const FALLBACK_RULE: &str = "unmatched_symptoms_fallback";
/// Name used for the residual-risk default.
pub const RESIDUAL_RISK_RULE: &str = "residual_risk_factors";

/// The ordered rule bank. Aggregation is max-based, so order does not
/// affect the result.
pub static RULE_BANK: [Rule; 17] = [
    // High risk
    Rule {
        name: "acute_coronary_syndrome",
        category: RiskCategory::High,
        description: "Chest pain together with cold sweat",
        evaluate: |a| {
            let s = &a.symptoms;
            when(s.get(Symptom::ChestPain).min(s.get(Symptom::ColdSweat)) > 0.5, || 0.95)
        },
    },
    Rule {
        name: "chest_pain_at_risk_age",
        category: RiskCategory::High,
        description: "Chest pain in a middle-aged or elderly patient",
        evaluate: |a| {
            let chest = a.symptoms.get(Symptom::ChestPain);
            when(chest > 0.0 && (a.age.adult > 0.7 || a.age.elderly > 0.3), || {
                chest.min((a.age.adult * 0.7).max(a.age.elderly)) * 0.9
            })
        },
    },
    Rule {
        name: "chest_pain_with_dyspnea",
        category: RiskCategory::High,
        description: "Chest pain together with shortness of breath",
        evaluate: |a| {
            let chest = a.symptoms.get(Symptom::ChestPain);
            let breath = a.symptoms.get(Symptom::ShortnessOfBreath);
            when(chest > 0.0 && breath > 0.0, || chest.min(breath) * 0.85)
        },
    },
    Rule {
        name: "history_with_major_symptom",
        category: RiskCategory::High,
        description: "Known heart disease with a major symptom",
        evaluate: |a| {
            let major = a.symptoms.major();
            when(a.history.disease > 0.0 && major > 0.3, || (major * 1.2).min(1.0) * 0.9)
        },
    },
    Rule {
        name: "severe_hypertension_with_symptoms",
        category: RiskCategory::High,
        description: "Very high pressure with any cardiac symptom",
        evaluate: |a| {
            let very_high = a.pressure.very_high;
            let major = a.symptoms.major();
            let minor = a.symptoms.minor();
            when(very_high > 0.6 && (major > 0.0 || minor > 0.0), || {
                very_high.min(major.max(minor)) * 0.85
            })
        },
    },
    Rule {
        name: "heart_failure_syndrome",
        category: RiskCategory::High,
        description: "Shortness of breath with leg swelling",
        evaluate: |a| {
            let s = &a.symptoms;
            let failure = s.get(Symptom::ShortnessOfBreath).min(s.get(Symptom::LegSwelling));
            when(failure > 0.4, || failure * 0.8)
        },
    },
    Rule {
        name: "high_symptom_burden",
        category: RiskCategory::High,
        description: "Five or more active symptoms",
        evaluate: |a| when(a.symptoms.active_count() >= 5, || 0.8),
    },
    // Medium risk: only without red-flag symptoms
    Rule {
        name: "exertional_angina",
        category: RiskCategory::Medium,
        description: "Chest pain with fatigue, no cold sweat or dyspnea",
        evaluate: |a| {
            let s = &a.symptoms;
            let angina = s.get(Symptom::ChestPain).min(s.get(Symptom::Fatigue));
            let red_flag =
                s.is_present(Symptom::ColdSweat) || s.is_present(Symptom::ShortnessOfBreath);
            when(angina > 0.3 && !red_flag, || angina * 0.8)
        },
    },
    Rule {
        name: "accumulated_risk_factors",
        category: RiskCategory::Medium,
        description: "Two or more risk factors with minor symptoms",
        evaluate: |a| {
            let factors = a.history.smoking + a.bmi.excess() + a.pressure.elevated();
            let minor = a.symptoms.minor();
            when(factors >= 2.0 && minor > 0.0 && a.symptoms.major() == 0.0, || {
                (factors / 3.0).min(1.0) * minor.max(0.3) * 0.75
            })
        },
    },
    Rule {
        name: "obesity_hypertension_edema",
        category: RiskCategory::Medium,
        description: "Obesity and elevated pressure with leg swelling",
        evaluate: |a| {
            let obese = a.bmi.obese;
            let elevated = a.pressure.elevated();
            let guard = obese > 0.5
                && elevated > 0.5
                && a.symptoms.is_present(Symptom::LegSwelling)
                && a.symptoms.major() == 0.0;
            when(guard, || obese.min(elevated) * 0.7)
        },
    },
    Rule {
        name: "stress_palpitations_with_risk",
        category: RiskCategory::Medium,
        description: "Palpitations under distress with smoking or elevated pressure",
        evaluate: |a| {
            let guard = a.symptoms.get(Symptom::Palpitations) > 0.5
                && a.psych.is_distressed()
                && (a.history.smoking > 0.0 || a.pressure.elevated() > 0.3);
            when(guard, || 0.6)
        },
    },
    Rule {
        name: "multiple_minor_symptoms",
        category: RiskCategory::Medium,
        description: "Three or more symptoms, all minor or non-specific",
        evaluate: |a| {
            let s = &a.symptoms;
            when(
                s.active_count() >= 3 && s.major() == 0.0 && s.minor() > 0.5,
                || 0.65,
            )
        },
    },
    Rule {
        name: "elderly_nonspecific_with_risk",
        category: RiskCategory::Medium,
        description: "Elderly patient with weakness or dizziness and a risk factor",
        evaluate: |a| {
            let guard = a.age.elderly > 0.6
                && a.symptoms.non_specific() > 0.0
                && a.symptoms.major() == 0.0
                && (a.history.smoking > 0.0 || a.pressure.elevated() > 0.3);
            when(guard, || a.age.elderly * 0.8 * 0.6)
        },
    },
    // Low risk
    Rule {
        name: "young_nonspecific",
        category: RiskCategory::Low,
        description: "Non-specific symptoms in a young, normal-weight, factor-free patient",
        evaluate: |a| {
            let guard = a.symptoms.non_specific() > 0.0
                && a.age.is_young()
                && a.bmi.normal > 0.5
                && !a.has_history_or_distress();
            when(guard, || 0.5)
        },
    },
    Rule {
        name: "single_minor_symptom",
        category: RiskCategory::Low,
        description: "One non-major symptom with normal pressure and no factors",
        evaluate: |a| {
            let guard = a.symptoms.active_count() == 1
                && a.symptoms.major() == 0.0
                && !a.has_history_or_distress()
                && a.pressure.normal > 0.5;
            when(guard, || 0.6)
        },
    },
    Rule {
        name: "isolated_stress_palpitations",
        category: RiskCategory::Low,
        description: "Palpitations explained by distress",
        evaluate: |a| {
            let s = &a.symptoms;
            let guard = s.get(Symptom::Palpitations) > 0.5
                && s.active_count() <= 2
                && a.psych.is_distressed()
                && s.major() == 0.0;
            when(guard, || 0.55)
        },
    },
    Rule {
        name: "isolated_fatigue",
        category: RiskCategory::Low,
        description: "Fatigue in an otherwise normal profile",
        evaluate: |a| {
            let s = &a.symptoms;
            let guard = s.get(Symptom::Fatigue) > 0.5
                && s.active_count() <= 2
                && a.pressure.normal > 0.5
                && a.bmi.normal > 0.3;
            when(guard, || 0.4)
        },
    },
];

/// Evaluate the whole bank and apply the default policy.
///
/// Rules whose strength does not exceed `min_activation` are dropped.
/// A patient with no active symptom gets either the not-detected sentinel
/// or, with residual risk factors, a weak low-risk firing. A patient whose
/// symptoms fired nothing gets the low-risk fallback.
#[must_use]
pub fn evaluate_rules(antecedents: &Antecedents, config: &RuleConfig) -> Vec<RuleFiring> {
    let mut firings: Vec<RuleFiring> = RULE_BANK
        .iter()
        .filter_map(|rule| {
            rule.evaluate(antecedents).map(|strength| RuleFiring {
                rule: rule.name,
                category: rule.category,
                strength,
            })
        })
        .collect();

    let active = antecedents.symptoms.active_count();
    if active == 0 {
        let default = if antecedents.has_residual_risk() {
            RuleFiring {
                rule: RESIDUAL_RISK_RULE,
                category: RiskCategory::Low,
                strength: config.residual_risk_strength,
            }
        } else {
            RuleFiring {
                rule: NO_SYMPTOMS_RULE,
                category: RiskCategory::NotDetected,
                strength: 1.0,
            }
        };
        firings.push(default);
    }

    firings.retain(|firing| firing.strength > config.min_activation);

    if firings.is_empty() && active > 0 {
        tracing::debug!("No rule fired for {} active symptoms, using fallback", active);
        firings.push(RuleFiring {
            rule: FALLBACK_RULE,
            category: RiskCategory::Low,
            strength: config.fallback_strength,
        });
    }

    for firing in &firings {
        tracing::debug!(
            "Rule {} fired: {} at {:.3}",
            firing.rule,
            firing.category,
            firing.strength
        );
    }

    firings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, PatientInput, PsychologicalState, SymptomSet};
    use crate::engine::EngineConfig;

    fn fire(patient: &PatientInput) -> Vec<RuleFiring> {
        let config = EngineConfig::default();
        let antecedents = Antecedents::from_patient(patient, &config);
        evaluate_rules(&antecedents, &config.rules)
    }

    fn fired(firings: &[RuleFiring], name: &str) -> Option<f64> {
        firings.iter().find(|f| f.rule == name).map(|f| f.strength)
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<_> = RULE_BANK.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULE_BANK.len());
    }

    #[test]
    fn test_no_symptoms_is_not_detected() {
        let patient = PatientInput::new(30, Gender::Male, 67.375, 1.75);
        let firings = fire(&patient);
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].category, RiskCategory::NotDetected);
        assert_eq!(firings[0].strength, 1.0);
    }

    #[test]
    fn test_smoker_without_symptoms_gets_residual_low() {
        let patient = PatientInput::new(40, Gender::Male, 73.5, 1.75).with_smoking(true);
        let firings = fire(&patient);
        assert_eq!(fired(&firings, RESIDUAL_RISK_RULE), Some(0.3));
        assert!(fired(&firings, NO_SYMPTOMS_RULE).is_none());
    }

    #[test]
    fn test_acute_coronary_syndrome() {
        let patient = PatientInput::new(50, Gender::Male, 80.0, 1.75)
            .with_symptom(Symptom::ChestPain)
            .with_symptom(Symptom::ColdSweat);
        let firings = fire(&patient);
        assert_eq!(fired(&firings, "acute_coronary_syndrome"), Some(0.95));
        assert!(firings.iter().all(|f| f.category != RiskCategory::Medium));
    }

    #[test]
    fn test_chest_pain_with_dyspnea() {
        let patient = PatientInput::new(50, Gender::Male, 79.625, 1.75)
            .with_pressure(135.0, 85.0)
            .with_symptom(Symptom::ChestPain)
            .with_symptom(Symptom::ShortnessOfBreath);
        let firings = fire(&patient);
        assert_eq!(fired(&firings, "chest_pain_with_dyspnea"), Some(0.85));
        assert!(fired(&firings, "exertional_angina").is_none());
    }

    #[test]
    fn test_all_symptoms_fire_burden_rule() {
        let patient = PatientInput::new(75, Gender::Male, 90.0, 1.63)
            .with_pressure(190.0, 115.0)
            .with_disease_history(true)
            .with_symptoms(SymptomSet::all_present());
        let firings = fire(&patient);
        assert_eq!(fired(&firings, "high_symptom_burden"), Some(0.8));
        assert_eq!(fired(&firings, "acute_coronary_syndrome"), Some(0.95));
        assert!(firings.iter().all(|f| f.category != RiskCategory::Medium));
    }

    #[test]
    fn test_young_single_dizziness_is_low() {
        let patient = PatientInput::new(25, Gender::Male, 67.375, 1.75)
            .with_pressure(118.0, 76.0)
            .with_symptom(Symptom::Dizziness);
        let firings = fire(&patient);
        assert_eq!(fired(&firings, "single_minor_symptom"), Some(0.6));
        assert!(fired(&firings, "young_nonspecific").is_none());
        assert!(firings.iter().all(|f| f.category == RiskCategory::Low));
    }

    #[test]
    fn test_anxious_palpitations() {
        let patient = PatientInput::new(28, Gender::Female, 53.76, 1.6)
            .with_pressure(115.0, 75.0)
            .with_psychological_state(PsychologicalState::Anxiety)
            .with_symptom(Symptom::Palpitations);
        let firings = fire(&patient);
        assert_eq!(fired(&firings, "isolated_stress_palpitations"), Some(0.55));
        assert_eq!(fired(&firings, "stress_palpitations_with_risk"), Some(0.6));
    }

    #[test]
    fn test_weak_firings_are_dropped() {
        let patient = PatientInput::new(30, Gender::Male, 70.0, 1.75).with_symptom(Symptom::Weakness);
        let config = EngineConfig::default();
        let antecedents = Antecedents::from_patient(&patient, &config);
        let strict = RuleConfig {
            min_activation: 0.9,
            ..RuleConfig::default()
        };
        let firings = evaluate_rules(&antecedents, &strict);
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].rule, FALLBACK_RULE);
        assert_eq!(firings[0].strength, strict.fallback_strength);
    }

    fn assert_fires(firings: &[RuleFiring], name: &str, expected: f64) {
        let strength = fired(firings, name).unwrap_or_else(|| panic!("{name} should fire: {firings:?}"));
        assert!((strength - expected).abs() < 1e-9, "{name}: {strength} != {expected}");
    }

    fn with_symptoms(patient: PatientInput, symptoms: &[Symptom]) -> PatientInput {
        symptoms.iter().fold(patient, |p, s| p.with_symptom(*s))
    }

    #[test]
    fn test_chest_pain_at_risk_age() {
        let patient = PatientInput::new(39, Gender::Male, 67.375, 1.75).with_symptom(Symptom::ChestPain);
        assert_fires(&fire(&patient), "chest_pain_at_risk_age", 0.63);

        let teen = PatientInput::new(15, Gender::Male, 55.0, 1.65).with_symptom(Symptom::ChestPain);
        assert!(fired(&fire(&teen), "chest_pain_at_risk_age").is_none());
    }

    #[test]
    fn test_history_with_major_symptom() {
        let patient = PatientInput::new(45, Gender::Male, 73.5, 1.75)
            .with_disease_history(true)
            .with_symptom(Symptom::ShortnessOfBreath);
        assert_fires(&fire(&patient), "history_with_major_symptom", 0.9);

        let no_history = patient.with_disease_history(false);
        assert!(fired(&fire(&no_history), "history_with_major_symptom").is_none());
    }

    #[test]
    fn test_severe_hypertension_threshold() {
        // Deviation score crosses very_high = 0.6 between 180 and 185 mmHg
        let base = PatientInput::new(45, Gender::Male, 73.5, 1.75).with_symptom(Symptom::Palpitations);

        let below = fire(&base.clone().with_pressure(180.0, 80.0));
        assert!(fired(&below, "severe_hypertension_with_symptoms").is_none());

        let above = fire(&base.clone().with_pressure(185.0, 80.0));
        let strength = fired(&above, "severe_hypertension_with_symptoms").expect("Should fire");
        assert!((strength - 0.5432).abs() < 1e-3, "{strength}");

        let severe = fire(&base.with_pressure(190.0, 80.0));
        let strength = fired(&severe, "severe_hypertension_with_symptoms").expect("Should fire");
        assert!((strength - 0.6047).abs() < 1e-3, "{strength}");
    }

    #[test]
    fn test_heart_failure_syndrome() {
        let patient = with_symptoms(
            PatientInput::new(50, Gender::Male, 73.5, 1.75),
            &[Symptom::ShortnessOfBreath, Symptom::LegSwelling],
        );
        assert_fires(&fire(&patient), "heart_failure_syndrome", 0.64);
    }

    #[test]
    fn test_symptom_burden_threshold() {
        let minor = [
            Symptom::Palpitations,
            Symptom::ColdSweat,
            Symptom::LegSwelling,
            Symptom::Fatigue,
            Symptom::Weakness,
        ];
        let base = PatientInput::new(40, Gender::Male, 73.5, 1.75);

        let five = fire(&with_symptoms(base.clone(), &minor));
        assert_fires(&five, "high_symptom_burden", 0.8);

        let four = fire(&with_symptoms(base, &minor[..4]));
        assert!(fired(&four, "high_symptom_burden").is_none());
    }

    #[test]
    fn test_exertional_angina() {
        let patient = with_symptoms(
            PatientInput::new(20, Gender::Male, 67.375, 1.75).with_pressure(118.0, 75.0),
            &[Symptom::ChestPain, Symptom::Fatigue],
        );
        assert_fires(&fire(&patient), "exertional_angina", 0.56);

        let sweating = patient.with_symptom(Symptom::ColdSweat);
        assert!(fired(&fire(&sweating), "exertional_angina").is_none());
    }

    #[test]
    fn test_accumulated_risk_factors() {
        // Smoking 1.0 + obesity 1.0 + elevated 0.249 at the ideal pressure
        let patient = PatientInput::new(45, Gender::Male, 107.1875, 1.75)
            .with_pressure(124.0, 77.0)
            .with_smoking(true)
            .with_symptom(Symptom::Fatigue);
        let firings = fire(&patient);
        let strength = fired(&firings, "accumulated_risk_factors").expect("Should fire");
        assert!((strength - 0.393_637).abs() < 1e-5, "{strength}");

        let non_smoker = patient.with_smoking(false);
        assert!(fired(&fire(&non_smoker), "accumulated_risk_factors").is_none());
    }

    #[test]
    fn test_obesity_hypertension_edema() {
        let patient = PatientInput::new(45, Gender::Male, 107.1875, 1.75)
            .with_pressure(160.0, 95.0)
            .with_symptom(Symptom::LegSwelling);
        let firings = fire(&patient);
        let strength = fired(&firings, "obesity_hypertension_edema").expect("Should fire");
        assert!((strength - 0.695_144).abs() < 1e-5, "{strength}");

        let chest_pain = patient.with_symptom(Symptom::ChestPain);
        assert!(fired(&fire(&chest_pain), "obesity_hypertension_edema").is_none());
    }

    #[test]
    fn test_multiple_minor_symptoms() {
        let patient = with_symptoms(
            PatientInput::new(35, Gender::Male, 70.4375, 1.75).with_pressure(118.0, 76.0),
            &[Symptom::Palpitations, Symptom::LegSwelling, Symptom::Fatigue],
        );
        assert_fires(&fire(&patient), "multiple_minor_symptoms", 0.65);
    }

    #[test]
    fn test_elderly_nonspecific_with_risk() {
        let patient = PatientInput::new(70, Gender::Male, 70.0, 1.7)
            .with_smoking(true)
            .with_symptom(Symptom::Dizziness);
        assert_fires(&fire(&patient), "elderly_nonspecific_with_risk", 0.48);

        let middle_aged = PatientInput { age: 50, ..patient };
        assert!(fired(&fire(&middle_aged), "elderly_nonspecific_with_risk").is_none());
    }

    #[test]
    fn test_young_nonspecific() {
        let teen = with_symptoms(
            PatientInput::new(16, Gender::Female, 60.0, 1.7),
            &[Symptom::Weakness, Symptom::Dizziness],
        );
        assert_fires(&fire(&teen), "young_nonspecific", 0.5);

        for age in [57, 58] {
            let older = PatientInput { age, ..teen.clone() };
            assert!(fired(&fire(&older), "young_nonspecific").is_none(), "age {age}");
        }
    }

    #[test]
    fn test_isolated_fatigue() {
        let patient = PatientInput::new(30, Gender::Male, 67.375, 1.75)
            .with_pressure(118.0, 75.0)
            .with_symptom(Symptom::Fatigue);
        let firings = fire(&patient);
        assert_fires(&firings, "isolated_fatigue", 0.4);
        assert_fires(&firings, "single_minor_symptom", 0.6);
    }
}

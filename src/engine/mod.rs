//! Fuzzy inference engine.
//!
//! Pipeline: fuzzification → rule evaluation → max aggregation → centroid
//! defuzzification → result formatting. The engine is immutable after
//! construction and holds no per-request state.

mod config;
mod defuzzify;
mod format;
mod fuzzify;
mod membership;
mod rules;

pub use config::{
    AdviceTexts, AgeTerms, BmiTerms, ConfigError, EngineConfig, OutputTerms, PressureTerms,
    PsychologyTable, RuleConfig, ScoreBands, StressProfile, SymptomWeights, ENGINE_CONFIG_ENV,
};
pub use defuzzify::{aggregate, centroid, output_membership, AggregatedOutput};
pub use format::{format_result, recommendations, risk_factors, RiskFactor, MAX_RECOMMENDATIONS};
pub use fuzzify::{
    AgeMembership, Antecedents, BmiMembership, HistoryMembership, PressureMembership,
    PsychMembership, SymptomMembership,
};
pub use membership::{gaussian_membership, Curve};
pub use rules::{evaluate_rules, RiskCategory, Rule, RuleFiring, RULE_BANK};

use serde::Serialize;

use crate::domain::{DiagnosisResult, PatientInput};
use crate::ports::RiskEngine;

/// Full trace of one assessment.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub result: DiagnosisResult,
    /// Centroid before rounding
    pub raw_score: f64,
    pub aggregated: AggregatedOutput,
    pub firings: Vec<RuleFiring>,
    pub antecedents: Antecedents,
}

/// Mamdani fuzzy-inference engine for cardiovascular risk.
///
/// `Send + Sync`; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct FuzzyEngine {
    config: EngineConfig,
}

impl FuzzyEngine {
    /// Build an engine over a validated configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if any parameter is degenerate.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Membership vectors for `patient`.
    #[must_use]
    pub fn fuzzify(&self, patient: &PatientInput) -> Antecedents {
        Antecedents::from_patient(patient, &self.config)
    }

    /// Run the whole pipeline on an already validated patient.
    #[must_use]
    pub fn assess(&self, patient: &PatientInput) -> Assessment {
        let antecedents = self.fuzzify(patient);
        tracing::debug!(
            "Fuzzified: pressure score {:.2}, {} active symptoms, distress {:.2}",
            antecedents.pressure.score,
            antecedents.symptoms.active_count(),
            antecedents.psych.distress()
        );

        let firings = evaluate_rules(&antecedents, &self.config.rules);
        let aggregated = aggregate(&firings);
        let raw_score = centroid(&aggregated, &self.config.output);
        let result = format_result(raw_score, patient, &antecedents, &self.config);

        tracing::debug!(
            "Assessment: {} rules fired, dominant {}, score {:.2}, tier {}",
            firings.len(),
            aggregated
                .dominant()
                .map_or("none", |category| category.as_str()),
            result.score,
            result.risk_tier
        );

        Assessment {
            result,
            raw_score,
            aggregated,
            firings,
            antecedents,
        }
    }
}

impl Default for FuzzyEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

impl RiskEngine for FuzzyEngine {
    fn assess(&self, patient: &PatientInput) -> Assessment {
        FuzzyEngine::assess(self, patient)
    }

    fn name(&self) -> &'static str {
        "mamdani-centroid"
    }
}

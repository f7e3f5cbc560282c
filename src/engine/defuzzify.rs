//! Max aggregation and centroid defuzzification.

use serde::Serialize;

use super::config::OutputTerms;
use super::membership::Curve;
use super::rules::{RiskCategory, RuleFiring};

/// Lower bound of the output universe.
pub const SCORE_MIN: u32 = 0;
/// Upper bound of the output universe.
pub const SCORE_MAX: u32 = 100;

/// Strongest firing per output category. Categories that never fired are 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregatedOutput {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub not_detected: f64,
}

impl AggregatedOutput {
    #[must_use]
    pub fn strength(&self, category: RiskCategory) -> f64 {
        match category {
            RiskCategory::Low => self.low,
            RiskCategory::Medium => self.medium,
            RiskCategory::High => self.high,
            RiskCategory::NotDetected => self.not_detected,
        }
    }

    fn slot(&mut self, category: RiskCategory) -> &mut f64 {
        match category {
            RiskCategory::Low => &mut self.low,
            RiskCategory::Medium => &mut self.medium,
            RiskCategory::High => &mut self.high,
            RiskCategory::NotDetected => &mut self.not_detected,
        }
    }

    /// Dominant scored category, ignoring the not-detected sentinel.
    #[must_use]
    pub fn dominant(&self) -> Option<RiskCategory> {
        [
            (RiskCategory::High, self.high),
            (RiskCategory::Medium, self.medium),
            (RiskCategory::Low, self.low),
        ]
        .into_iter()
        .filter(|(_, strength)| *strength > 0.0)
        .fold(None, |best: Option<(RiskCategory, f64)>, candidate| match best {
            Some((_, strength)) if strength >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(category, _)| category)
    }
}

/// Combine firings per category with `max`.
#[must_use]
pub fn aggregate(firings: &[RuleFiring]) -> AggregatedOutput {
    let mut output = AggregatedOutput::default();
    for firing in firings {
        let slot = output.slot(firing.category);
        *slot = slot.max(firing.strength);
    }
    output
}

fn output_terms(terms: &OutputTerms) -> [(RiskCategory, &Curve); 3] {
    [
        (RiskCategory::Low, &terms.low),
        (RiskCategory::Medium, &terms.medium),
        (RiskCategory::High, &terms.high),
    ]
}

/// Clipped and merged output membership at `x`.
///
/// Each category with nonzero strength contributes its term clipped at
/// that strength; the curve is the pointwise max.
#[must_use]
pub fn output_membership(x: f64, aggregated: &AggregatedOutput, terms: &OutputTerms) -> f64 {
    output_terms(terms)
        .into_iter()
        .filter_map(|(category, curve)| {
            let strength = aggregated.strength(category);
            (strength > 0.0).then(|| curve.evaluate(x).min(strength))
        })
        .fold(0.0, f64::max)
}

/// Centroid of the merged output curve over integer x in [0, 100].
///
/// Returns 0 when the not-detected sentinel is fully active or when the
/// curve has no area. The result always lies in [0, 100].
#[must_use]
pub fn centroid(aggregated: &AggregatedOutput, terms: &OutputTerms) -> f64 {
    if aggregated.not_detected >= 1.0 {
        return 0.0;
    }

    let (moment, area) = (SCORE_MIN..=SCORE_MAX).fold((0.0, 0.0), |(moment, area), x| {
        let x = f64::from(x);
        let mu = output_membership(x, aggregated, terms);
        (moment + x * mu, area + mu)
    });

    if area <= 0.0 {
        return 0.0;
    }
    (moment / area).clamp(f64::from(SCORE_MIN), f64::from(SCORE_MAX))
}

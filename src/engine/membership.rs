//! Membership functions.
//!
//! Every linguistic term in the engine is a Gaussian, optionally held at
//! 1.0 beyond its mean for open-ended categories ("low" pressure, "very
//! high" pressure).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Gaussian membership `exp(-0.5 * ((x - mean) / std)^2)`.
///
/// Returns exactly 1.0 at `x == mean`. `std` must be positive; curves
/// built through [`Curve::try_gaussian`] or validated by
/// [`Curve::validate`] guarantee that.
#[must_use]
pub fn gaussian_membership(x: f64, mean: f64, std: f64) -> f64 {
    debug_assert!(std > 0.0, "gaussian std must be positive");
    let z = (x - mean) / std;
    (-0.5 * z * z).exp()
}

/// Shape of a linguistic term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Curve {
    /// Symmetric bell around `mean`
    Gaussian { mean: f64, std: f64 },
    /// 1.0 for `x <= mean`, Gaussian tail above
    LeftShoulder { mean: f64, std: f64 },
    /// 1.0 for `x >= mean`, Gaussian tail below
    RightShoulder { mean: f64, std: f64 },
}

impl Curve {
    /// Unchecked constructor for built-in parameter tables.
    #[must_use]
    pub const fn gaussian(mean: f64, std: f64) -> Self {
        Self::Gaussian { mean, std }
    }

    #[must_use]
    pub const fn left_shoulder(mean: f64, std: f64) -> Self {
        Self::LeftShoulder { mean, std }
    }

    #[must_use]
    pub const fn right_shoulder(mean: f64, std: f64) -> Self {
        Self::RightShoulder { mean, std }
    }

    /// Checked Gaussian constructor.
    ///
    /// # Errors
    /// Returns `ConfigError::DegenerateCurve` for a non-positive or
    /// non-finite `std`, `ConfigError::NonFinite` for a non-finite mean.
    pub fn try_gaussian(mean: f64, std: f64) -> Result<Self, ConfigError> {
        let curve = Self::gaussian(mean, std);
        curve.validate("gaussian")?;
        Ok(curve)
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Gaussian { mean, .. }
            | Self::LeftShoulder { mean, .. }
            | Self::RightShoulder { mean, .. } => mean,
        }
    }

    #[must_use]
    pub fn std(&self) -> f64 {
        match *self {
            Self::Gaussian { std, .. }
            | Self::LeftShoulder { std, .. }
            | Self::RightShoulder { std, .. } => std,
        }
    }

    /// Degree of membership of `x`, in (0, 1].
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            Self::Gaussian { mean, std } => gaussian_membership(x, mean, std),
            Self::LeftShoulder { mean, std } => {
                if x <= mean {
                    1.0
                } else {
                    gaussian_membership(x, mean, std)
                }
            }
            Self::RightShoulder { mean, std } => {
                if x >= mean {
                    1.0
                } else {
                    gaussian_membership(x, mean, std)
                }
            }
        }
    }

    /// Reject parameters that would divide by zero or produce NaN.
    ///
    /// # Errors
    /// Returns a `ConfigError` naming `term`.
    pub fn validate(&self, term: &str) -> Result<(), ConfigError> {
        if !self.mean().is_finite() {
            return Err(ConfigError::NonFinite(format!("{term}.mean")));
        }
        let std = self.std();
        if !std.is_finite() || std <= 0.0 {
            return Err(ConfigError::DegenerateCurve {
                term: term.to_string(),
                std,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_peak_is_exactly_one() {
        for (mean, std) in [(0.0, 1.0), (70.0, 10.0), (-20.0, 0.001), (1e6, 1e-3)] {
            assert_eq!(gaussian_membership(mean, mean, std), 1.0);
        }
    }

    #[test]
    fn test_gaussian_one_std_away() {
        let expected = (-0.5f64).exp();
        assert!((gaussian_membership(80.0, 70.0, 10.0) - expected).abs() < 1e-12);
        assert!((gaussian_membership(60.0, 70.0, 10.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_shoulders_saturate() {
        let high = Curve::right_shoulder(50.0, 20.0);
        assert_eq!(high.evaluate(50.0), 1.0);
        assert_eq!(high.evaluate(120.0), 1.0);
        assert!(high.evaluate(30.0) < 1.0);

        let low = Curve::left_shoulder(-20.0, 10.0);
        assert_eq!(low.evaluate(-45.0), 1.0);
        assert!(low.evaluate(0.0) < 0.2);
    }

    #[test]
    fn test_zero_std_is_a_config_error() {
        let err = Curve::try_gaussian(25.0, 0.0).expect_err("Should reject");
        assert!(matches!(err, ConfigError::DegenerateCurve { .. }));
        assert!(Curve::try_gaussian(25.0, f64::NAN).is_err());
        assert!(Curve::try_gaussian(f64::INFINITY, 1.0).is_err());
        assert!(Curve::try_gaussian(25.0, 15.0).is_ok());
    }

    #[test]
    fn test_curve_json_shape() {
        let json = serde_json::to_string(&Curve::gaussian(25.0, 15.0)).expect("Should serialize");
        assert_eq!(json, r#"{"shape":"gaussian","mean":25.0,"std":15.0}"#);
        let parsed: Curve =
            serde_json::from_str(r#"{"shape":"right_shoulder","mean":50,"std":20}"#)
                .expect("Should parse");
        assert_eq!(parsed, Curve::right_shoulder(50.0, 20.0));
    }
}

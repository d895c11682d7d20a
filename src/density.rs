//! Univariate normal density with maximum-likelihood fitting.

use crate::error::{AffectError, Result};
use std::f64::consts::PI;

/// Floor applied to fitted standard deviations so that a degenerate sample
/// (all values equal, or a single value) never yields a singular density.
pub const SIGMA_FLOOR: f64 = 1e-6;

/// A univariate Gaussian used as a class-conditional density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianDensity {
    mean: f64,
    std: f64,
}

impl GaussianDensity {
    /// Standard normal distribution.
    pub fn standard() -> Self {
        Self { mean: 0.0, std: 1.0 }
    }

    /// Density with explicit parameters.
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        if std <= 0.0 || !std.is_finite() {
            return Err(AffectError::Numeric(format!(
                "standard deviation must be positive and finite, got {std}"
            )));
        }
        Ok(Self { mean, std })
    }

    /// Maximum-likelihood fit: sample mean and sample standard deviation,
    /// with the deviation floored at [`SIGMA_FLOOR`].
    pub fn fit(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(AffectError::Data(
                "cannot fit a Gaussian to an empty sample".into(),
            ));
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt().max(SIGMA_FLOOR);
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std(&self) -> f64 {
        self.std
    }

    /// Likelihood of a single observation under this density.
    pub fn likelihood(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std;
        (1.0 / ((2.0 * PI).sqrt() * self.std)) * (-0.5 * z * z).exp()
    }
}

impl Default for GaussianDensity {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_normal_peak() {
        let g = GaussianDensity::standard();
        let peak = 1.0 / (2.0 * PI).sqrt();
        assert!((g.likelihood(0.0) - peak).abs() < 1e-12);
        assert!(g.likelihood(1.0) < g.likelihood(0.0));
    }

    #[test]
    fn mle_fit_recovers_moments() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let g = GaussianDensity::fit(&samples).unwrap();
        assert!((g.mean() - 5.0).abs() < 1e-12);
        assert!((g.std() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_sample_is_floored() {
        let g = GaussianDensity::fit(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(g.std(), SIGMA_FLOOR);
        assert!(g.likelihood(3.0).is_finite());
    }

    #[test]
    fn empty_sample_is_a_data_error() {
        assert!(GaussianDensity::fit(&[]).is_err());
    }
}

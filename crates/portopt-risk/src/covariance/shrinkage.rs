//! Shrinkage toward the scaled identity with a closed-form (OAS) or fixed intensity.

use super::{CovarianceEstimator, centered, check_observations};
use crate::error::{Result, RiskError};
use ndarray::Array2;

fn empirical_covariance(returns: &Array2<f64>) -> Array2<f64> {
    let x = centered(returns, true);
    x.t().dot(&x) / returns.nrows() as f64
}

fn shrink(cov: &Array2<f64>, intensity: f64) -> Array2<f64> {
    let n = cov.nrows();
    let mu = cov.diag().sum() / n as f64;
    cov * (1.0 - intensity) + &(Array2::<f64>::eye(n) * (intensity * mu))
}

/// Oracle approximating shrinkage (Chen et al., 2010).
#[derive(Debug, Clone, Copy, Default)]
pub struct OasEstimator;

impl OasEstimator {
    /// Shrinkage intensity for `returns`.
    pub fn intensity(&self, returns: &Array2<f64>) -> Result<f64> {
        check_observations(returns, 2)?;
        Ok(oas_intensity(&empirical_covariance(returns), returns.nrows()))
    }
}

fn oas_intensity(cov: &Array2<f64>, n_samples: usize) -> f64 {
    let p = cov.nrows() as f64;
    let mu = cov.diag().sum() / p;
    let alpha = cov.iter().map(|v| v * v).sum::<f64>() / (p * p);
    let num = alpha + mu * mu;
    let den = (n_samples as f64 + 1.0) * (alpha - mu * mu / p);
    if den == 0.0 { 1.0 } else { (num / den).min(1.0) }
}

impl CovarianceEstimator for OasEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>> {
        check_observations(returns, 2)?;
        let cov = empirical_covariance(returns);
        let intensity = oas_intensity(&cov, returns.nrows());
        Ok(shrink(&cov, intensity))
    }
}

/// Shrinkage with a fixed intensity (default 0.1).
#[derive(Debug, Clone, Copy)]
pub struct FixedShrinkageEstimator {
    intensity: f64,
}

impl FixedShrinkageEstimator {
    /// Create an estimator; `intensity` must lie in `[0, 1]`.
    pub fn new(intensity: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(RiskError::InvalidParameter(format!(
                "shrinkage intensity must be within [0, 1], got {intensity}"
            )));
        }
        Ok(Self { intensity })
    }
}

impl Default for FixedShrinkageEstimator {
    fn default() -> Self {
        Self { intensity: 0.1 }
    }
}

impl CovarianceEstimator for FixedShrinkageEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>> {
        check_observations(returns, 2)?;
        Ok(shrink(&empirical_covariance(returns), self.intensity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn returns() -> Array2<f64> {
        array![
            [0.01, 0.02, -0.01],
            [-0.02, 0.01, 0.00],
            [0.015, -0.005, 0.02],
            [0.00, 0.01, -0.015],
            [0.02, 0.03, 0.01],
        ]
    }

    #[test]
    fn test_fixed_shrinkage_preserves_trace() {
        let r = returns();
        let emp = empirical_covariance(&r);
        let shrunk = FixedShrinkageEstimator::default().estimate(&r).unwrap();
        assert_relative_eq!(shrunk.diag().sum(), emp.diag().sum(), epsilon = 1e-15);
        assert_relative_eq!(shrunk[[0, 1]], 0.9 * emp[[0, 1]], epsilon = 1e-15);
    }

    #[test]
    fn test_fixed_shrinkage_rejects_bad_intensity() {
        assert!(FixedShrinkageEstimator::new(1.5).is_err());
    }

    #[test]
    fn test_oas_intensity_bounds() {
        let delta = OasEstimator.intensity(&returns()).unwrap();
        assert!(delta > 0.0 && delta <= 1.0);
    }
}

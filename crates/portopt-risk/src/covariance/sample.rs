//! Sample covariance estimator.

use super::{CovarianceEstimator, centered, check_observations};
use crate::error::Result;
use ndarray::Array2;

/// Unbiased sample covariance (denominator `T - 1`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleCovarianceEstimator;

impl CovarianceEstimator for SampleCovarianceEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>> {
        check_observations(returns, 2)?;
        let x = centered(returns, true);
        Ok(x.t().dot(&x) / (returns.nrows() as f64 - 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_sample_covariance() {
        let r = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let cov = SampleCovarianceEstimator.estimate(&r).unwrap();
        assert_relative_eq!(cov[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_data() {
        let r = Array2::<f64>::zeros((1, 3));
        assert!(SampleCovarianceEstimator.estimate(&r).is_err());
    }
}

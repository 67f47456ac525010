//! Ledoit-Wolf Shrinkage Covariance Estimator
//!
//! Shrinks the sample covariance `S` toward the scaled identity
//! `F = trace(S)/n I`: `Σ = δ F + (1 - δ) S`, with the intensity `δ` chosen
//! analytically (Ledoit & Wolf, 2004).

use super::{CovarianceEstimator, centered, check_observations};
use crate::error::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Ledoit-Wolf covariance estimator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedoitWolfConfig {
    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Whether to center returns (subtract mean) before computing covariance
    pub center: bool,
}

impl Default for LedoitWolfConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            center: true,
        }
    }
}

/// Ledoit-Wolf shrinkage covariance estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct LedoitWolfEstimator {
    config: LedoitWolfConfig,
}

impl LedoitWolfEstimator {
    /// Create a new Ledoit-Wolf estimator with the given configuration
    pub const fn new(config: LedoitWolfConfig) -> Self {
        Self { config }
    }

    /// Maximum-likelihood covariance `X'X / T` of the (optionally centered) returns
    fn sample_covariance(&self, returns: &Array2<f64>) -> Array2<f64> {
        let x = centered(returns, self.config.center);
        x.t().dot(&x) / returns.nrows() as f64
    }

    /// Scaled identity with the average variance on the diagonal.
    fn shrinkage_target(sample_cov: &Array2<f64>) -> Array2<f64> {
        let n = sample_cov.nrows();
        let mu = sample_cov.diag().sum() / n as f64;
        Array2::<f64>::eye(n) * mu
    }

    /// Optimal intensity `clamp(rho / gamma, 0, 1)` where `pi` is the
    /// dispersion of the outer products around `S`, `rho = pi_F - pi` and
    /// `gamma = ||S - F||²`.
    fn shrinkage_intensity(
        &self,
        returns: &Array2<f64>,
        sample_cov: &Array2<f64>,
        target: &Array2<f64>,
    ) -> f64 {
        let x = centered(returns, self.config.center);
        let t = x.nrows() as f64;

        let mut pi = 0.0;
        let mut pi_target = 0.0;
        for row in x.rows() {
            for i in 0..row.len() {
                for j in 0..row.len() {
                    let outer = row[i] * row[j];
                    pi += (outer - sample_cov[[i, j]]).powi(2);
                    pi_target += (outer - target[[i, j]]).powi(2);
                }
            }
        }
        pi /= t;
        pi_target /= t;

        let gamma: f64 = (sample_cov - target).iter().map(|d| d * d).sum();
        if gamma > 0.0 {
            ((pi_target - pi) / gamma).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Shrinkage intensity that [`CovarianceEstimator::estimate`] would apply.
    pub fn intensity(&self, returns: &Array2<f64>) -> Result<f64> {
        check_observations(returns, self.config.min_observations)?;
        let sample_cov = self.sample_covariance(returns);
        let target = Self::shrinkage_target(&sample_cov);
        Ok(self.shrinkage_intensity(returns, &sample_cov, &target))
    }
}

impl CovarianceEstimator for LedoitWolfEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>> {
        check_observations(returns, self.config.min_observations)?;

        let sample_cov = self.sample_covariance(returns);
        let target = Self::shrinkage_target(&sample_cov);
        let delta = self.shrinkage_intensity(returns, &sample_cov, &target);
        trace!(delta, "ledoit-wolf shrinkage");

        Ok(&target * delta + &sample_cov * (1.0 - delta))
    }
}

//! Exponentially Weighted Moving Average (EWMA) Covariance Estimator
//!
//! EWMA gives more weight to recent observations. Observation weights come
//! from [`ewma_weights`]; the covariance uses the weighted mean and the
//! unbiased correction `1 / (1 - sum w^2)` for normalized weights.

use super::{CovarianceEstimator, check_observations};
use crate::error::{Result, RiskError};
use crate::mean::ewma_weights;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// EWMA covariance estimator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EwmaConfig {
    /// Decay factor (default: 0.94)
    /// Higher values = more weight on past, slower adaptation
    pub decay: f64,

    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Bias-adjusted weights (`true`) or the recursive form (`false`)
    pub adjust: bool,
}

impl Default for EwmaConfig {
    fn default() -> Self {
        Self {
            decay: 0.94,
            min_observations: 2,
            adjust: true,
        }
    }
}

/// EWMA covariance estimator
#[derive(Debug, Clone, Copy)]
pub struct EwmaCovarianceEstimator {
    config: EwmaConfig,
}

impl EwmaCovarianceEstimator {
    /// Create a new EWMA estimator with the given configuration
    pub fn new(config: EwmaConfig) -> Result<Self> {
        if config.decay <= 0.0 || config.decay >= 1.0 {
            return Err(RiskError::InvalidDecay(config.decay));
        }
        Ok(Self { config })
    }

    /// Half-life of the weights in periods: `ln(0.5) / ln(decay)`.
    pub fn half_life(&self) -> f64 {
        0.5_f64.ln() / self.config.decay.ln()
    }
}

impl CovarianceEstimator for EwmaCovarianceEstimator {
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>> {
        check_observations(returns, self.config.min_observations.max(2))?;
        let (n_periods, n_assets) = returns.dim();

        let w = ewma_weights(n_periods, self.config.decay, self.config.adjust)?;
        let means = returns.t().dot(&w);
        let correction = 1.0 - w.iter().map(|v| v * v).sum::<f64>();
        if correction <= 0.0 {
            return Err(RiskError::InsufficientData {
                required: 2,
                actual: n_periods,
            });
        }

        let mut cov = Array2::<f64>::zeros((n_assets, n_assets));
        for t in 0..n_periods {
            for i in 0..n_assets {
                let ri = returns[[t, i]] - means[i];
                for j in i..n_assets {
                    cov[[i, j]] += w[t] * ri * (returns[[t, j]] - means[j]);
                }
            }
        }
        for i in 0..n_assets {
            for j in i..n_assets {
                cov[[i, j]] /= correction;
                cov[[j, i]] = cov[[i, j]];
            }
        }

        Ok(cov)
    }
}

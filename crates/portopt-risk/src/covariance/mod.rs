//! Covariance estimation
//!
//! Estimators of the asset covariance matrix from a periods x assets return
//! matrix, selected by [`CovarianceMethod`].

pub mod ewma;
pub mod ledoit_wolf;
pub mod sample;
pub mod shrinkage;

pub use ewma::{EwmaConfig, EwmaCovarianceEstimator};
pub use ledoit_wolf::{LedoitWolfConfig, LedoitWolfEstimator};
pub use sample::SampleCovarianceEstimator;
pub use shrinkage::{FixedShrinkageEstimator, OasEstimator};

use crate::error::{Result, RiskError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from asset returns
    ///
    /// # Arguments
    /// * `returns` - Matrix where each row is a time period and each column is an asset
    ///
    /// # Returns
    /// * Estimated covariance matrix (N x N where N is number of assets)
    fn estimate(&self, returns: &Array2<f64>) -> Result<Array2<f64>>;
}

/// Covariance estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CovarianceMethod {
    /// Sample covariance
    #[default]
    Hist,
    /// EWMA with bias-adjusted weights
    Ewma1,
    /// Recursive EWMA
    Ewma2,
    /// Ledoit-Wolf shrinkage toward the scaled identity
    Ledoit,
    /// Oracle approximating shrinkage
    Oas,
    /// Fixed 0.1 shrinkage toward the scaled identity
    Shrunk,
    /// Graphical lasso
    Gl,
    /// j-LoGo
    Jlogo,
    /// Eigenvalue denoising, fixed method
    Fixed,
    /// Eigenvalue denoising, spectral method
    Spectral,
    /// Eigenvalue denoising, target shrinkage
    Shrink,
}

impl CovarianceMethod {
    /// Every method, in option order.
    pub const ALL: [Self; 11] = [
        Self::Hist,
        Self::Ewma1,
        Self::Ewma2,
        Self::Ledoit,
        Self::Oas,
        Self::Shrunk,
        Self::Gl,
        Self::Jlogo,
        Self::Fixed,
        Self::Spectral,
        Self::Shrink,
    ];

    /// Option key.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Hist => "hist",
            Self::Ewma1 => "ewma1",
            Self::Ewma2 => "ewma2",
            Self::Ledoit => "ledoit",
            Self::Oas => "oas",
            Self::Shrunk => "shrunk",
            Self::Gl => "gl",
            Self::Jlogo => "jlogo",
            Self::Fixed => "fixed",
            Self::Spectral => "spectral",
            Self::Shrink => "shrink",
        }
    }

    /// Whether [`estimate_covariance`] implements this method.
    pub const fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::Hist | Self::Ewma1 | Self::Ewma2 | Self::Ledoit | Self::Oas | Self::Shrunk
        )
    }
}

impl fmt::Display for CovarianceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CovarianceMethod {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RiskError::UnknownOption {
                kind: "covariance method",
                value: s.to_string(),
                choices: Self::ALL
                    .iter()
                    .map(|m| m.key())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Estimate the covariance of `returns` with `method`; `decay` drives the EWMA methods.
pub fn estimate_covariance(
    returns: &Array2<f64>,
    method: CovarianceMethod,
    decay: f64,
) -> Result<Array2<f64>> {
    debug!(%method, assets = returns.ncols(), periods = returns.nrows(), "estimating covariance");
    match method {
        CovarianceMethod::Hist => SampleCovarianceEstimator.estimate(returns),
        CovarianceMethod::Ewma1 | CovarianceMethod::Ewma2 => {
            EwmaCovarianceEstimator::new(EwmaConfig {
                decay,
                adjust: method == CovarianceMethod::Ewma1,
                ..EwmaConfig::default()
            })?
            .estimate(returns)
        }
        CovarianceMethod::Ledoit => LedoitWolfEstimator::default().estimate(returns),
        CovarianceMethod::Oas => OasEstimator.estimate(returns),
        CovarianceMethod::Shrunk => FixedShrinkageEstimator::default().estimate(returns),
        other => Err(RiskError::Unsupported {
            kind: "covariance method",
            value: other.key().to_string(),
        }),
    }
}

/// Center the columns of `returns` when `center` is set.
pub(crate) fn centered(returns: &Array2<f64>, center: bool) -> Array2<f64> {
    if !center {
        return returns.clone();
    }
    match returns.mean_axis(ndarray::Axis(0)) {
        Some(means) => returns - &means.insert_axis(ndarray::Axis(0)),
        None => returns.clone(),
    }
}

/// Reject return matrices with fewer than `required` rows.
pub(crate) fn check_observations(returns: &Array2<f64>, required: usize) -> Result<()> {
    if returns.nrows() < required {
        return Err(RiskError::InsufficientData {
            required,
            actual: returns.nrows(),
        });
    }
    Ok(())
}

//! Expected return estimators.

use crate::error::{Result, RiskError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Method used to estimate expected returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeanMethod {
    /// Arithmetic mean
    #[default]
    Hist,
    /// Exponentially weighted mean with bias adjustment
    Ewma1,
    /// Exponentially weighted mean computed recursively
    Ewma2,
}

impl MeanMethod {
    /// Option key.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Hist => "hist",
            Self::Ewma1 => "ewma1",
            Self::Ewma2 => "ewma2",
        }
    }
}

impl fmt::Display for MeanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MeanMethod {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hist" => Ok(Self::Hist),
            "ewma1" => Ok(Self::Ewma1),
            "ewma2" => Ok(Self::Ewma2),
            _ => Err(RiskError::UnknownOption {
                kind: "mean method",
                value: s.to_string(),
                choices: "hist, ewma1, ewma2".to_string(),
            }),
        }
    }
}

/// Observation weights of an exponentially weighted window, oldest first,
/// normalized to sum to one.
///
/// `adjust = true` weights observation `i` by `d^(T-1-i)`. `adjust = false`
/// follows the recursion `y_t = (1 - d) x_t + d y_(t-1)` seeded with the
/// first observation.
pub fn ewma_weights(n: usize, decay: f64, adjust: bool) -> Result<Array1<f64>> {
    if !(decay > 0.0 && decay < 1.0) {
        return Err(RiskError::InvalidDecay(decay));
    }
    if n == 0 {
        return Ok(Array1::zeros(0));
    }
    let mut w = Array1::from_shape_fn(n, |i| decay.powi((n - 1 - i) as i32));
    if !adjust {
        w.mapv_inplace(|v| v * (1.0 - decay));
        w[0] = decay.powi((n - 1) as i32);
    }
    let total = w.sum();
    Ok(w / total)
}

/// Expected return of every column of `returns`.
pub fn estimate_mean(returns: &Array2<f64>, method: MeanMethod, decay: f64) -> Result<Array1<f64>> {
    let n = returns.nrows();
    if n == 0 {
        return Err(RiskError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    match method {
        MeanMethod::Hist => Ok(returns
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(returns.ncols()))),
        MeanMethod::Ewma1 | MeanMethod::Ewma2 => {
            let w = ewma_weights(n, decay, method == MeanMethod::Ewma1)?;
            Ok(returns.t().dot(&w))
        }
    }
}

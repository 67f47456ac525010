//! Historical risk measures of a portfolio return series.
//!
//! Every function takes the realized series `X = R w` and returns the risk
//! as a positive number in the units of `X` (losses are positive).

use crate::drawdown::drawdown_risk;
use crate::error::{Result, RiskError};
use crate::measure::{RiskMeasure, RiskParams};
use portopt_data::ReturnTable;
use serde::{Deserialize, Serialize};

/// Scores portfolios on historical returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRiskScorer {
    params: RiskParams,
}

impl HistoricalRiskScorer {
    /// Create a scorer with the given tail parameters.
    pub const fn new(params: RiskParams) -> Self {
        Self { params }
    }

    /// Tail parameters in use.
    pub const fn params(&self) -> &RiskParams {
        &self.params
    }

    /// Risk of the portfolio `weights` (column order of `returns`).
    ///
    /// `rf` is the per-period minimum acceptable return used by the lower
    /// partial moments.
    pub fn risk(
        &self,
        returns: &ReturnTable,
        weights: &[f64],
        measure: RiskMeasure,
        rf: f64,
    ) -> Result<f64> {
        if weights.len() != returns.n_assets() {
            return Err(RiskError::DimensionMismatch {
                expected: returns.n_assets(),
                actual: weights.len(),
            });
        }
        if returns.n_periods() < 2 {
            return Err(RiskError::InsufficientData {
                required: 2,
                actual: returns.n_periods(),
            });
        }
        self.params.validate()?;

        let series = returns.portfolio_returns(weights).to_vec();
        Ok(series_risk(&series, measure, rf, &self.params))
    }
}

/// Risk of a realized return series.
pub fn series_risk(x: &[f64], measure: RiskMeasure, rf: f64, params: &RiskParams) -> f64 {
    if let Some(value) = drawdown_risk(x, measure, params) {
        return value;
    }

    match measure {
        RiskMeasure::Mv => std_dev(x),
        RiskMeasure::Mad => mean_absolute_deviation(x),
        RiskMeasure::Gmd => gini_mean_difference(x),
        RiskMeasure::Msv => semi_deviation(x),
        RiskMeasure::Flpm => lower_partial_moment(x, rf, 1),
        RiskMeasure::Slpm => lower_partial_moment(x, rf, 2),
        RiskMeasure::Var => var_hist(x, params.alpha),
        RiskMeasure::Cvar => cvar_hist(x, params.alpha),
        RiskMeasure::Tg => tail_gini(x, params.alpha, params.a_sim),
        RiskMeasure::Evar => evar_hist(x, params.alpha),
        RiskMeasure::Rg => max(x) - min(x),
        RiskMeasure::Cvrg => cvar_hist(x, params.alpha) + cvar_hist(&negated(x), params.beta()),
        RiskMeasure::Tgrg => {
            tail_gini(x, params.alpha, params.a_sim)
                + tail_gini(&negated(x), params.beta(), params.b_sim())
        }
        RiskMeasure::Wr => -min(x),
        // drawdown measures were handled above
        _ => f64::NAN,
    }
}

fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

fn min(x: &[f64]) -> f64 {
    x.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(x: &[f64]) -> f64 {
    x.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn negated(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| -v).collect()
}

fn sorted(x: &[f64]) -> Vec<f64> {
    let mut s = x.to_vec();
    s.sort_by(f64::total_cmp);
    s
}

/// Sample standard deviation (denominator `T - 1`).
pub fn std_dev(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    let m = mean(x);
    (x.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (x.len() as f64 - 1.0)).sqrt()
}

/// Mean absolute deviation around the mean.
pub fn mean_absolute_deviation(x: &[f64]) -> f64 {
    let m = mean(x);
    mean(&x.iter().map(|v| (v - m).abs()).collect::<Vec<_>>())
}

/// Semi standard deviation: dispersion of returns below the mean.
pub fn semi_deviation(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    let m = mean(x);
    let sum: f64 = x.iter().map(|v| (v - m).min(0.0).powi(2)).sum();
    (sum / (x.len() as f64 - 1.0)).sqrt()
}

/// Lower partial moment of order 1 or 2 relative to `mar`.
pub fn lower_partial_moment(x: &[f64], mar: f64, order: u32) -> f64 {
    let shortfalls = x.iter().map(|v| (mar - v).max(0.0));
    match order {
        1 => shortfalls.sum::<f64>() / x.len() as f64,
        p => {
            let denom = (x.len() as f64 - 1.0).max(1.0);
            (shortfalls.map(|s| s.powi(p as i32)).sum::<f64>() / denom).powf(1.0 / f64::from(p))
        }
    }
}

/// Gini mean difference as an ordered weighted average.
pub fn gini_mean_difference(x: &[f64]) -> f64 {
    let t = x.len();
    if t < 2 {
        return 0.0;
    }
    let tf = t as f64;
    sorted(x)
        .iter()
        .enumerate()
        .map(|(i, v)| 2.0 * (2.0 * (i + 1) as f64 - 1.0 - tf) / (tf * (tf - 1.0)) * v)
        .sum()
}

fn tail_index(t: usize, alpha: f64) -> usize {
    ((alpha * t as f64).ceil() as usize).clamp(1, t) - 1
}

/// Historical value at risk at significance `alpha`.
pub fn var_hist(x: &[f64], alpha: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let s = sorted(x);
    -s[tail_index(s.len(), alpha)]
}

/// Historical conditional value at risk at significance `alpha`.
///
/// Interpolates the partial observation at the quantile boundary.
pub fn cvar_hist(x: &[f64], alpha: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let s = sorted(x);
    let index = tail_index(s.len(), alpha);
    let excess: f64 = s[..=index].iter().map(|v| v - s[index]).sum();
    -s[index] - excess / (alpha * s.len() as f64)
}

/// Tail Gini: average of the CVaRs at `a_sim` significance levels spread
/// evenly up to `alpha`, each weighted by its level times its spacing, so the
/// deeper tail counts less.
pub fn tail_gini(x: &[f64], alpha: f64, a_sim: usize) -> f64 {
    const LOWEST: f64 = 1e-4;
    if a_sim <= 1 || alpha <= LOWEST {
        return cvar_hist(x, alpha);
    }
    let step = (alpha - LOWEST) / (a_sim - 1) as f64;
    let mut previous = 0.0;
    let mut total = 0.0;
    let mut norm = 0.0;
    for i in 0..a_sim {
        let level = LOWEST + step * i as f64;
        let weight = level * (level - previous);
        total += weight * cvar_hist(x, level);
        norm += weight;
        previous = level;
    }
    total / norm
}

/// Historical entropic value at risk at significance `alpha`.
///
/// Minimizes `z ln(E[exp(-X/z)] / alpha)` over `z > 0` by golden-section
/// search on `ln z`.
pub fn evar_hist(x: &[f64], alpha: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let objective = |log_z: f64| {
        let z = log_z.exp();
        let scaled: Vec<f64> = x.iter().map(|v| -v / z).collect();
        let peak = max(&scaled);
        let lse = peak + (scaled.iter().map(|s| (s - peak).exp()).sum::<f64>() / x.len() as f64).ln();
        z * (lse - alpha.ln())
    };

    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut lo, mut hi) = (-25.0_f64, 10.0_f64);
    let mut c = hi - inv_phi * (hi - lo);
    let mut d = lo + inv_phi * (hi - lo);
    let (mut fc, mut fd) = (objective(c), objective(d));
    for _ in 0..200 {
        if fc < fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - inv_phi * (hi - lo);
            fc = objective(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + inv_phi * (hi - lo);
            fd = objective(d);
        }
        if hi - lo < 1e-10 {
            break;
        }
    }
    objective((lo + hi) / 2.0).min(objective(-25.0))
}

//! Cumulative value paths and drawdown-based risk measures.
//!
//! Uncompounded paths accumulate returns additively starting from 1, so a
//! drawdown is an absolute loss in return units. Compounded paths multiply
//! gross returns starting from 1 and drawdowns are relative to the running
//! peak.

use crate::measure::{RiskMeasure, RiskParams};
use crate::scorer::{cvar_hist, evar_hist, var_hist};

/// `1 + cumsum(r)` with the starting value prepended.
pub fn uncompounded_path(returns: &[f64]) -> Vec<f64> {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut level = 1.0;
    path.push(level);
    for r in returns {
        level += r;
        path.push(level);
    }
    path
}

/// `cumprod(1 + r)` with the starting value 1 prepended.
pub fn compounded_path(returns: &[f64]) -> Vec<f64> {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut level = 1.0;
    path.push(level);
    for r in returns {
        level *= 1.0 + r;
        path.push(level);
    }
    path
}

/// Drawdown at every point of the path as a non-positive number.
///
/// The first point is always zero.
pub fn drawdowns(returns: &[f64], compounded: bool) -> Vec<f64> {
    let path = if compounded {
        compounded_path(returns)
    } else {
        uncompounded_path(returns)
    };

    let mut peak = f64::NEG_INFINITY;
    path.iter()
        .map(|&level| {
            peak = peak.max(level);
            if compounded {
                if peak > 0.0 { level / peak - 1.0 } else { 0.0 }
            } else {
                level - peak
            }
        })
        .collect()
}

/// Drawdown risk of a return series. `None` for non-drawdown measures.
pub fn drawdown_risk(returns: &[f64], measure: RiskMeasure, params: &RiskParams) -> Option<f64> {
    if !measure.is_drawdown() || returns.is_empty() {
        return None;
    }
    let dd = drawdowns(returns, measure.is_compounded());
    let t = returns.len() as f64;
    let tail = &dd[1..];

    let value = match measure {
        RiskMeasure::Mdd | RiskMeasure::MddRel => -dd.iter().copied().fold(0.0, f64::min),
        RiskMeasure::Add | RiskMeasure::AddRel => -dd.iter().sum::<f64>() / t,
        RiskMeasure::Dar | RiskMeasure::DarRel => var_hist(tail, params.alpha),
        RiskMeasure::Cdar | RiskMeasure::CdarRel => cvar_hist(tail, params.alpha),
        RiskMeasure::Edar | RiskMeasure::EdarRel => evar_hist(tail, params.alpha),
        RiskMeasure::Uci | RiskMeasure::UciRel => (dd.iter().map(|d| d * d).sum::<f64>() / t).sqrt(),
        _ => return None,
    };
    Some(value)
}

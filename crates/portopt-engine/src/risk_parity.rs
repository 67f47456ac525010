//! Risk budgeting portfolios.
//!
//! The budgeting problem `min risk(x) - sum_i b_i ln(x_i)` over `x > 0` has a
//! solution whose risk contributions are proportional to `b`; normalizing it
//! gives the fully invested portfolio. MV is solved by cyclical coordinate
//! descent on the variance form, every other measure by projected gradient.

use crate::ReferenceEngine;
use crate::error::{EngineError, Result, solution};
use crate::mean_risk::to_weights;
use crate::moments::{Moments, RiskFunction, per_period_return};
use crate::solver::{FeasibleSet, Problem, SolverConfig, minimize};
use ndarray::{Array1, Array2};
use portopt::{RelaxedRiskParityParams, RelaxedVersion, RiskParityOptimizer, RiskParityParams};
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::{RiskMeasure, RiskParams, Weights};
use tracing::debug;

const FLOOR: f64 = 1e-12;

/// Normalized risk budgets; equal budgets when none are given.
pub(crate) fn risk_budgets(budgets: Option<&[f64]>, n: usize) -> Result<Array1<f64>> {
    let Some(b) = budgets else {
        return Ok(Array1::from_elem(n, 1.0 / n.max(1) as f64));
    };
    if b.len() != n {
        return Err(EngineError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    if b.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(EngineError::Infeasible(
            "risk budgets must be positive".to_string(),
        ));
    }
    let total: f64 = b.iter().sum();
    Ok(Array1::from(b.iter().map(|v| v / total).collect::<Vec<_>>()))
}

/// Cyclical coordinate descent on `1/2 x'Cx - sum_i b_i ln(x_i)`.
fn mv_budgeting(
    cov: &Array2<f64>,
    budgets: &Array1<f64>,
    config: &SolverConfig,
) -> Result<Array1<f64>> {
    let n = budgets.len();
    let diag = cov.diag();
    if diag.iter().any(|&c| c <= 0.0) {
        return Err(EngineError::Infeasible(
            "an asset has no variance".to_string(),
        ));
    }
    let mut x = Array1::from_shape_fn(n, |i| 1.0 / diag[i].sqrt());

    for iter in 0..config.max_iter {
        let mut change: f64 = 0.0;
        for i in 0..n {
            let c = diag[i];
            let s = cov.row(i).dot(&x) - c * x[i];
            let next = (-s + (s * s + 4.0 * c * budgets[i]).sqrt()) / (2.0 * c);
            change = change.max((next - x[i]).abs() / next.max(FLOOR));
            x[i] = next;
        }
        if change < config.tol {
            debug!(iter, "risk budgeting converged");
            break;
        }
    }
    normalize(x)
}

struct BudgetBarrier<'a> {
    risk: RiskFunction<'a>,
    budgets: &'a Array1<f64>,
}

impl Problem for BudgetBarrier<'_> {
    fn value(&self, x: &Array1<f64>) -> f64 {
        if x.iter().any(|&v| v <= 0.0) {
            return f64::INFINITY;
        }
        self.risk.value(x) - self.budgets.dot(&x.mapv(f64::ln))
    }

    fn gradient(&self, x: &Array1<f64>) -> Array1<f64> {
        self.risk.gradient(x) - &(self.budgets / x)
    }
}

fn barrier_budgeting(
    risk: RiskFunction<'_>,
    budgets: &Array1<f64>,
    config: &SolverConfig,
) -> Result<Array1<f64>> {
    let n = budgets.len();
    let equal = Array1::from_elem(n, 1.0 / n as f64);
    let scale = risk.value(&equal);
    if !(scale.is_finite() && scale > 0.0) {
        return Err(EngineError::Infeasible(format!(
            "{} of the equal weight portfolio is not positive",
            risk.measure()
        )));
    }
    let problem = BudgetBarrier { risk, budgets };
    let x = minimize(
        &problem,
        &(equal / scale),
        &FeasibleSet::Positive { floor: FLOOR },
        config,
    );
    normalize(x)
}

/// Fractions whose `measure` contributions follow `budgets`; `rf` is per period.
pub(crate) fn budgeting(
    returns: &ReturnTable,
    moments: &Moments,
    measure: RiskMeasure,
    rf: f64,
    params: RiskParams,
    budgets: &Array1<f64>,
    config: &SolverConfig,
) -> Result<Array1<f64>> {
    match measure {
        RiskMeasure::Mv => mv_budgeting(&moments.cov, budgets, config),
        measure => {
            let risk = RiskFunction::new(returns, &moments.cov, measure, rf, params)?;
            barrier_budgeting(risk, budgets, config)
        }
    }
}

fn normalize(x: Array1<f64>) -> Result<Array1<f64>> {
    let total = x.sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(EngineError::Infeasible(
            "risk budgeting diverged".to_string(),
        ));
    }
    Ok(x / total)
}

fn check_target(
    moments: &Moments,
    w: &Array1<f64>,
    target: Option<f64>,
    freq: Frequency,
) -> Result<()> {
    if let Some(annual) = target {
        let floor = per_period_return(annual, freq);
        let achieved = moments.mu.dot(w);
        if achieved < floor {
            return Err(EngineError::Infeasible(format!(
                "risk parity return {achieved:.6} is below the target {floor:.6}"
            )));
        }
    }
    Ok(())
}

fn check_value(value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::Infeasible(format!(
            "budget must be positive, got {value}"
        )))
    }
}

/// Portfolio whose risk contributions follow `params.risk_cont`.
pub fn risk_parity(
    returns: &ReturnTable,
    freq: Frequency,
    params: &RiskParityParams,
    config: &SolverConfig,
) -> Result<Weights> {
    check_value(params.value)?;
    let n = returns.n_assets();
    if n == 0 {
        return Err(EngineError::Infeasible("empty universe".to_string()));
    }
    let budgets = risk_budgets(params.risk_cont.as_deref(), n)?;
    let moments = Moments::estimate(returns, &params.estimation)?;

    let rf = per_period_return(params.rf, freq);
    let w = budgeting(
        returns,
        &moments,
        params.risk_measure,
        rf,
        params.risk,
        &budgets,
        config,
    )?;
    check_target(&moments, &w, params.target_return, freq)?;
    Ok(to_weights(returns, &w, params.value))
}

/// Relaxed risk parity. Only version A, which carries no regularization term,
/// is implemented.
pub fn relaxed_risk_parity(
    returns: &ReturnTable,
    freq: Frequency,
    params: &RelaxedRiskParityParams,
    config: &SolverConfig,
) -> Result<Weights> {
    if params.version != RelaxedVersion::A {
        return Err(EngineError::unsupported(
            "relaxed risk parity version",
            params.version.key(),
        ));
    }
    check_value(params.value)?;
    let n = returns.n_assets();
    if n == 0 {
        return Err(EngineError::Infeasible("empty universe".to_string()));
    }
    let budgets = risk_budgets(params.risk_cont.as_deref(), n)?;
    let moments = Moments::estimate(returns, &params.estimation)?;
    let w = mv_budgeting(&moments.cov, &budgets, config)?;
    check_target(&moments, &w, params.target_return, freq)?;
    Ok(to_weights(returns, &w, params.value))
}

impl RiskParityOptimizer for ReferenceEngine {
    fn risk_parity(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &RiskParityParams,
    ) -> Option<Weights> {
        solution(risk_parity(returns, freq, params, self.config()), "risk parity")
    }

    fn relaxed_risk_parity(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &RelaxedRiskParityParams,
    ) -> Option<Weights> {
        solution(
            relaxed_risk_parity(returns, freq, params, self.config()),
            "relaxed risk parity",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_returns;
    use approx::assert_relative_eq;
    use portopt_risk::{HistoricalRiskScorer, risk_contributions};

    #[test]
    fn test_equal_mv_contributions() {
        let returns = sample_returns();
        let w = risk_parity(
            &returns,
            Frequency::Daily,
            &RiskParityParams::default(),
            &SolverConfig::default(),
        )
        .unwrap();
        let x = w.aligned(returns.tickers());
        let scorer = HistoricalRiskScorer::new(RiskParams::default());
        let rc = risk_contributions(&scorer, &returns, &x, RiskMeasure::Mv, 0.0).unwrap();
        let total: f64 = rc.iter().sum();
        for c in &rc {
            assert_relative_eq!(c / total, 0.25, epsilon = 1e-4);
        }
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_custom_budgets() {
        let returns = sample_returns();
        let params = RiskParityParams {
            risk_cont: Some(vec![4.0, 2.0, 1.0, 1.0]),
            ..Default::default()
        };
        let w = risk_parity(&returns, Frequency::Daily, &params, &SolverConfig::default()).unwrap();
        let x = w.aligned(returns.tickers());
        let scorer = HistoricalRiskScorer::new(RiskParams::default());
        let rc = risk_contributions(&scorer, &returns, &x, RiskMeasure::Mv, 0.0).unwrap();
        let total: f64 = rc.iter().sum();
        assert_relative_eq!(rc[0] / total, 0.5, epsilon = 1e-4);
        assert_relative_eq!(rc[3] / total, 0.125, epsilon = 1e-4);
    }

    #[test]
    fn test_budget_length_mismatch() {
        let params = RiskParityParams {
            risk_cont: Some(vec![1.0, 1.0]),
            ..Default::default()
        };
        let result = risk_parity(&sample_returns(), Frequency::Daily, &params, &SolverConfig::default());
        assert!(matches!(result, Err(EngineError::DimensionMismatch { expected: 4, actual: 2 })));
    }

    #[test]
    fn test_cvar_parity_is_fully_invested() {
        let returns = sample_returns();
        let params = RiskParityParams {
            risk_measure: RiskMeasure::Cvar,
            value: 500.0,
            ..Default::default()
        };
        let w = risk_parity(&returns, Frequency::Daily, &params, &SolverConfig::default()).unwrap();
        assert_relative_eq!(w.sum(), 500.0, epsilon = 1e-6);
        assert!(w.iter().all(|(_, v)| v > 0.0));
    }

    #[test]
    fn test_relaxed_versions() {
        let returns = sample_returns();
        let engine = ReferenceEngine::default();
        let a = engine.relaxed_risk_parity(&returns, Frequency::Daily, &RelaxedRiskParityParams::default());
        assert!(a.is_some());

        let params = RelaxedRiskParityParams {
            version: RelaxedVersion::C,
            ..Default::default()
        };
        assert!(engine.relaxed_risk_parity(&returns, Frequency::Daily, &params).is_none());
    }
}

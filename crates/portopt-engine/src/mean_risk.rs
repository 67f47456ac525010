//! Mean-risk, maximum diversification and maximum decorrelation portfolios.
//!
//! Every problem is solved on fractions that sum to one and scaled to the
//! budget afterwards. Targets are annual and converted to the return
//! frequency before solving.

use crate::ReferenceEngine;
use crate::error::{EngineError, Result, solution};
use crate::moments::{Moments, RiskFunction, covariance, per_period_return, per_period_risk};
use crate::solver::{FeasibleSet, Problem, SolverConfig, minimize};
use ndarray::{Array1, Array2};
use portopt::{Budget, DiversificationParams, MeanRiskOptimizer, MeanRiskParams, Objective};
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::correlation::cov_to_corr;
use portopt_risk::{RiskMeasure, RiskParams, Weights};
use tracing::debug;

const RISK_FLOOR: f64 = 1e-12;
const DUST: f64 = 1e-10;
const RETURN_TOL: f64 = 1e-12;

/// One mean-risk problem in per-period units.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MeanRiskTask {
    pub(crate) objective: Objective,
    pub(crate) measure: RiskMeasure,
    /// Per-period risk free rate
    pub(crate) rf: f64,
    pub(crate) risk: RiskParams,
    pub(crate) risk_aversion: f64,
    /// Per-period minimum expected return
    pub(crate) min_return: Option<f64>,
    /// Per-period maximum risk
    pub(crate) max_risk: Option<f64>,
}

impl MeanRiskTask {
    pub(crate) fn min_risk(measure: RiskMeasure, risk: RiskParams) -> Self {
        Self {
            objective: Objective::MinRisk,
            measure,
            rf: 0.0,
            risk,
            risk_aversion: 1.0,
            min_return: None,
            max_risk: None,
        }
    }
}

struct MeanRiskProblem<'a> {
    risk: RiskFunction<'a>,
    mu: &'a Array1<f64>,
    task: MeanRiskTask,
    penalty: f64,
}

impl Problem for MeanRiskProblem<'_> {
    fn value(&self, w: &Array1<f64>) -> f64 {
        let r = self.risk.value(w);
        let m = self.mu.dot(w);
        let base = match self.task.objective {
            Objective::MinRisk | Objective::Erc => r,
            Objective::Utility => -m + self.task.risk_aversion * r,
            Objective::Sharpe => -(m - self.task.rf) / r.max(RISK_FLOOR),
            Objective::MaxRet => -m,
        };
        base + self.breach(r).powi(2) * self.penalty
    }

    fn gradient(&self, w: &Array1<f64>) -> Array1<f64> {
        let r = self.risk.value(w);
        let dr = self.risk.gradient(w);
        let mut g = match self.task.objective {
            Objective::MinRisk | Objective::Erc => dr.clone(),
            Objective::Utility => &dr * self.task.risk_aversion - self.mu,
            Objective::Sharpe => {
                let r = r.max(RISK_FLOOR);
                let excess = self.mu.dot(w) - self.task.rf;
                &dr * (excess / (r * r)) - &(self.mu / r)
            }
            Objective::MaxRet => -self.mu,
        };
        let breach = self.breach(r);
        if breach > 0.0 {
            g = g + &dr * (2.0 * self.penalty * breach);
        }
        g
    }
}

impl MeanRiskProblem<'_> {
    fn breach(&self, r: f64) -> f64 {
        self.task.max_risk.map_or(0.0, |t| (r - t).max(0.0))
    }
}

/// Optimal fractions of `task` over the long-only simplex.
pub(crate) fn optimize(
    returns: &ReturnTable,
    moments: &Moments,
    task: MeanRiskTask,
    config: &SolverConfig,
) -> Result<Array1<f64>> {
    let n = returns.n_assets();
    if n == 0 {
        return Err(EngineError::Infeasible("empty universe".to_string()));
    }
    if task.objective == Objective::Erc {
        return Err(EngineError::unsupported("mean-risk objective", "erc"));
    }

    let set = FeasibleSet::simplex(1.0).with_min_return(&moments.mu, task.min_return);
    if !set.is_attainable() {
        return Err(EngineError::Infeasible(
            "target return above the best asset".to_string(),
        ));
    }
    let best = moments.mu.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    if task.objective == Objective::Sharpe && best <= task.rf {
        return Err(EngineError::Infeasible(
            "no asset earns more than the risk free rate".to_string(),
        ));
    }

    let problem = MeanRiskProblem {
        risk: RiskFunction::new(returns, &moments.cov, task.measure, task.rf, task.risk)?,
        mu: &moments.mu,
        task,
        penalty: config.penalty,
    };
    let start = Array1::from_elem(n, 1.0 / n as f64);
    let w = minimize(&problem, &start, &set, config);

    if let Some(limit) = task.max_risk {
        let achieved = problem.risk.value(&w);
        if achieved > limit * (1.0 + 1e-3) + RISK_FLOOR {
            return Err(EngineError::Infeasible(format!(
                "risk {achieved:.6} stays above the target {limit:.6}"
            )));
        }
    }
    if let Some(floor) = task.min_return {
        let achieved = moments.mu.dot(&w);
        if achieved < floor - RETURN_TOL {
            return Err(EngineError::Infeasible(format!(
                "return {achieved:.6} stays below the target {floor:.6}"
            )));
        }
    }
    debug!(
        objective = %task.objective,
        measure = %problem.risk.measure(),
        "mean-risk problem solved"
    );
    Ok(clean(w))
}

/// Zero out dust and renormalize to one.
pub(crate) fn clean(w: Array1<f64>) -> Array1<f64> {
    let w = w.mapv(|x| if x < DUST { 0.0 } else { x });
    let total = w.sum();
    if total > 0.0 { w / total } else { w }
}

/// Scale fractions to the budget.
pub(crate) fn to_weights(returns: &ReturnTable, fractions: &Array1<f64>, value: f64) -> Weights {
    let scaled = fractions.mapv(|x| x * value);
    Weights::from_parts(returns.tickers(), &scaled.to_vec())
}

pub(crate) fn check_budget(budget: &Budget) -> Result<()> {
    if budget.value_short > 0.0 {
        return Err(EngineError::unsupported(
            "short budget",
            format!("{}", budget.value_short),
        ));
    }
    if budget.value <= 0.0 {
        return Err(EngineError::Infeasible(format!(
            "budget must be positive, got {}",
            budget.value
        )));
    }
    Ok(())
}

/// Solve the mean-risk problem of `params`.
pub fn mean_risk(
    returns: &ReturnTable,
    freq: Frequency,
    params: &MeanRiskParams,
    config: &SolverConfig,
) -> Result<Weights> {
    check_budget(&params.budget)?;
    let moments = Moments::estimate(returns, &params.estimation)?;
    let task = MeanRiskTask {
        objective: params.objective,
        measure: params.risk_measure,
        rf: per_period_return(params.rf, freq),
        risk: params.risk,
        risk_aversion: params.risk_aversion,
        min_return: params.target_return.map(|r| per_period_return(r, freq)),
        max_risk: params
            .target_risk
            .map(|r| per_period_risk(r, params.risk_measure, freq)),
    };
    let w = optimize(returns, &moments, task, config)?;
    Ok(to_weights(returns, &w, params.budget.value))
}

struct DiversificationRatio<'a> {
    cov: &'a Array2<f64>,
    sigma: Array1<f64>,
}

impl Problem for DiversificationRatio<'_> {
    fn value(&self, w: &Array1<f64>) -> f64 {
        let s = w.dot(&self.cov.dot(w)).max(0.0).sqrt().max(RISK_FLOOR);
        -self.sigma.dot(w) / s
    }

    fn gradient(&self, w: &Array1<f64>) -> Array1<f64> {
        let cw = self.cov.dot(w);
        let s = w.dot(&cw).max(0.0).sqrt().max(RISK_FLOOR);
        let a = self.sigma.dot(w);
        cw * (a / s.powi(3)) - &(&self.sigma / s)
    }
}

struct Decorrelation {
    corr: Array2<f64>,
}

impl Problem for Decorrelation {
    fn value(&self, w: &Array1<f64>) -> f64 {
        w.dot(&self.corr.dot(w))
    }

    fn gradient(&self, w: &Array1<f64>) -> Array1<f64> {
        self.corr.dot(w) * 2.0
    }
}

/// Maximize `w'sigma / sqrt(w'Cw)`.
pub fn max_diversification(
    returns: &ReturnTable,
    params: &DiversificationParams,
    config: &SolverConfig,
) -> Result<Weights> {
    check_budget(&params.budget)?;
    let cov = covariance(returns, params.covariance, params.d_ewma)?;
    let problem = DiversificationRatio {
        sigma: cov.diag().mapv(|v| v.max(0.0).sqrt()),
        cov: &cov,
    };
    let w = solve_on_simplex(&problem, returns.n_assets(), config)?;
    Ok(to_weights(returns, &w, params.budget.value))
}

/// Minimize `w'Rw` with `R` the correlation matrix.
pub fn max_decorrelation(
    returns: &ReturnTable,
    params: &DiversificationParams,
    config: &SolverConfig,
) -> Result<Weights> {
    check_budget(&params.budget)?;
    let cov = covariance(returns, params.covariance, params.d_ewma)?;
    let problem = Decorrelation {
        corr: cov_to_corr(&cov),
    };
    let w = solve_on_simplex(&problem, returns.n_assets(), config)?;
    Ok(to_weights(returns, &w, params.budget.value))
}

fn solve_on_simplex<P: Problem>(problem: &P, n: usize, config: &SolverConfig) -> Result<Array1<f64>> {
    if n == 0 {
        return Err(EngineError::Infeasible("empty universe".to_string()));
    }
    let start = Array1::from_elem(n, 1.0 / n as f64);
    let w = minimize(problem, &start, &FeasibleSet::simplex(1.0), config);
    Ok(clean(w))
}

impl MeanRiskOptimizer for ReferenceEngine {
    fn mean_risk(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &MeanRiskParams,
    ) -> Option<Weights> {
        solution(mean_risk(returns, freq, params, self.config()), "mean-risk")
    }

    fn max_diversification(
        &self,
        returns: &ReturnTable,
        params: &DiversificationParams,
    ) -> Option<Weights> {
        solution(
            max_diversification(returns, params, self.config()),
            "maximum diversification",
        )
    }

    fn max_decorrelation(
        &self,
        returns: &ReturnTable,
        params: &DiversificationParams,
    ) -> Option<Weights> {
        solution(
            max_decorrelation(returns, params, self.config()),
            "maximum decorrelation",
        )
    }
}

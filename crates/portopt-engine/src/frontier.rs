//! Efficient frontier and random portfolios.

use crate::ReferenceEngine;
use crate::error::{EngineError, Result, solution};
use crate::mean_risk::{MeanRiskTask, check_budget, optimize, to_weights};
use crate::moments::{Moments, per_period_return};
use crate::solver::SolverConfig;
use portopt::{Estimation, FrontierGenerator, FrontierParams};
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::Weights;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

/// `params.points` minimum-risk portfolios with target returns spread evenly
/// from the global minimum risk portfolio to the best single asset.
pub fn efficient_frontier(
    returns: &ReturnTable,
    freq: Frequency,
    params: &FrontierParams,
    config: &SolverConfig,
) -> Result<Vec<Weights>> {
    check_budget(&params.budget)?;
    if params.points == 0 {
        return Err(EngineError::Infeasible("no frontier points requested".to_string()));
    }
    let moments = Moments::estimate(returns, &Estimation::default())?;
    let base = MeanRiskTask {
        rf: per_period_return(params.rf, freq),
        ..MeanRiskTask::min_risk(params.risk_measure, params.risk)
    };

    let lowest = optimize(returns, &moments, base, config)?;
    let r_min = moments.mu.dot(&lowest);
    let r_max = moments.mu.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let steps = params.points.saturating_sub(1).max(1) as f64;

    let mut frontier = vec![to_weights(returns, &lowest, params.budget.value)];
    for i in 1..params.points {
        let target = r_min + (r_max - r_min).max(0.0) * i as f64 / steps;
        let task = MeanRiskTask {
            min_return: Some(target),
            ..base
        };
        match optimize(returns, &moments, task, config) {
            Ok(w) => frontier.push(to_weights(returns, &w, params.budget.value)),
            Err(e) => warn!(point = i, target, error = %e, "frontier point skipped"),
        }
    }
    Ok(frontier)
}

/// `n` fully invested long-only portfolios drawn uniformly and normalized.
pub fn random_portfolios(tickers: &[String], n: usize, seed: u64) -> Vec<Weights> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let draws: Vec<f64> = tickers.iter().map(|_| rng.gen_range(0.0..1.0)).collect();
            let total: f64 = draws.iter().sum();
            if total > 0.0 {
                let fractions: Vec<f64> = draws.iter().map(|d| d / total).collect();
                Weights::from_parts(tickers, &fractions)
            } else {
                crate::weights::equal_weights(tickers, 1.0)
            }
        })
        .collect()
}

impl FrontierGenerator for ReferenceEngine {
    fn efficient_frontier(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &FrontierParams,
    ) -> Option<Vec<Weights>> {
        solution(
            efficient_frontier(returns, freq, params, self.config()),
            "efficient frontier",
        )
    }

    fn random_portfolios(&self, tickers: &[String], n: usize, seed: u64) -> Vec<Weights> {
        random_portfolios(tickers, n, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_returns;
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use portopt_risk::RiskMeasure;
    use rstest::rstest;

    #[test]
    fn test_frontier_returns_increase() {
        let returns = sample_returns();
        let params = FrontierParams {
            points: 8,
            ..Default::default()
        };
        let frontier =
            efficient_frontier(&returns, Frequency::Daily, &params, &SolverConfig::default())
                .unwrap();
        assert!(frontier.len() >= 2);

        let mu = returns.mean();
        let expected: Vec<f64> = frontier
            .iter()
            .map(|w| mu.dot(&Array1::from(w.aligned(returns.tickers()))))
            .collect();
        for pair in expected.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9);
        }
        for w in &frontier {
            assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[rstest]
    #[case(RiskMeasure::Mv)]
    #[case(RiskMeasure::Mad)]
    #[case(RiskMeasure::Gmd)]
    #[case(RiskMeasure::Msv)]
    #[case(RiskMeasure::Flpm)]
    #[case(RiskMeasure::Slpm)]
    #[case(RiskMeasure::Var)]
    #[case(RiskMeasure::Cvar)]
    #[case(RiskMeasure::Wr)]
    #[case(RiskMeasure::Mdd)]
    #[case(RiskMeasure::Cdar)]
    fn test_frontier_keeps_every_point(#[case] measure: RiskMeasure) {
        let returns = sample_returns();
        let params = FrontierParams {
            points: 6,
            risk_measure: measure,
            ..Default::default()
        };
        let frontier =
            efficient_frontier(&returns, Frequency::Daily, &params, &SolverConfig::default())
                .unwrap();
        assert_eq!(frontier.len(), 6);

        let mu = returns.mean();
        let best = mu.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let last = frontier.last().unwrap();
        assert_relative_eq!(
            mu.dot(&Array1::from(last.aligned(returns.tickers()))),
            best,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_two_asset_frontier_is_complete() {
        let returns = sample_returns().select(&[0, 2]);
        let params = FrontierParams {
            points: 20,
            ..Default::default()
        };
        let frontier =
            efficient_frontier(&returns, Frequency::Daily, &params, &SolverConfig::default())
                .unwrap();
        assert_eq!(frontier.len(), 20);
    }

    #[test]
    fn test_random_portfolios_are_reproducible() {
        let tickers: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let first = random_portfolios(&tickers, 5, 123);
        let second = random_portfolios(&tickers, 5, 123);
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
        for w in &first {
            assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-12);
            assert!(w.iter().all(|(_, v)| v >= 0.0));
        }
        assert_ne!(first, random_portfolios(&tickers, 5, 124));
    }

    #[test]
    fn test_zero_points_has_no_frontier() {
        let params = FrontierParams {
            points: 0,
            ..Default::default()
        };
        assert!(ReferenceEngine::default()
            .efficient_frontier(&sample_returns(), Frequency::Daily, &params)
            .is_none());
    }
}

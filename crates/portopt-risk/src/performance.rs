//! Annualized performance statistics of an allocation.

use crate::error::{Result, RiskError};
use crate::measure::{RiskMeasure, RiskParams};
use crate::scorer::{HistoricalRiskScorer, std_dev};
use crate::weights::Weights;
use portopt_data::{Frequency, ReturnTable};
use serde::{Deserialize, Serialize};

/// Risk figure reported next to the return and volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasuredRisk {
    /// Measure used
    pub measure: RiskMeasure,
    /// Risk value; annualized by `sqrt(time factor)` unless the measure is a drawdown
    pub value: f64,
    /// `(expected return - rf) / value`
    pub ratio: f64,
}

/// Expected return, volatility, Sharpe ratio and an optional second risk measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Periods per year used for annualization
    pub time_factor: f64,
    /// Annualized expected return
    pub expected_return: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// `(expected return - rf) / volatility`
    pub sharpe: f64,
    /// Populated when the measure is not MV
    pub risk: Option<MeasuredRisk>,
}

impl PerformanceStats {
    /// Compute the statistics of `weights` over `returns`.
    ///
    /// Weights that sum to a non-zero amount are rescaled to fractions first
    /// so currency allocations report percentage statistics. `rf` is annual.
    pub fn compute(
        weights: &Weights,
        returns: &ReturnTable,
        freq: Frequency,
        rf: f64,
        measure: RiskMeasure,
        params: &RiskParams,
    ) -> Result<Self> {
        if weights.is_empty() {
            return Err(RiskError::InvalidParameter("empty allocation".to_string()));
        }
        let weights = if weights.sum().abs() > 1e-9 {
            weights.normalized()
        } else {
            weights.clone()
        };
        let w = weights.aligned(returns.tickers());
        let tf = freq.time_factor();

        let series = returns.portfolio_returns(&w).to_vec();
        let expected_return = series.iter().sum::<f64>() / series.len().max(1) as f64 * tf;
        let volatility = std_dev(&series) * tf.sqrt();
        let sharpe = ratio(expected_return - rf, volatility);

        let risk = if measure == RiskMeasure::Mv {
            None
        } else {
            let scorer = HistoricalRiskScorer::new(*params);
            let raw = scorer.risk(returns, &w, measure, rf / tf)?;
            let value = if measure.scales_with_horizon() {
                raw * tf.sqrt()
            } else {
                raw
            };
            Some(MeasuredRisk {
                measure,
                value,
                ratio: ratio(expected_return - rf, value),
            })
        };

        Ok(Self {
            time_factor: tf,
            expected_return,
            volatility,
            sharpe,
            risk,
        })
    }
}

fn ratio(excess: f64, risk: f64) -> f64 {
    if risk.abs() < f64::EPSILON {
        0.0
    } else {
        excess / risk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::array;

    fn table() -> ReturnTable {
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        ReturnTable::new(
            vec!["A".to_string(), "B".to_string()],
            dates,
            array![[0.01, 0.03], [-0.02, 0.00], [0.02, -0.01], [0.01, 0.02]],
        )
        .unwrap()
    }

    #[test]
    fn test_mv_statistics() {
        let w = Weights::from_parts(&["A".to_string(), "B".to_string()], &[0.5, 0.5]);
        let stats = PerformanceStats::compute(
            &w,
            &table(),
            Frequency::Daily,
            0.0,
            RiskMeasure::Mv,
            &RiskParams::default(),
        )
        .unwrap();

        // portfolio returns 0.02, -0.01, 0.005, 0.015
        let series = [0.02, -0.01, 0.005, 0.015];
        assert_relative_eq!(stats.expected_return, 0.0075 * 252.0, epsilon = 1e-12);
        assert_relative_eq!(stats.volatility, std_dev(&series) * 252.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.sharpe, stats.expected_return / stats.volatility, epsilon = 1e-12);
        assert!(stats.risk.is_none());
    }

    #[test]
    fn test_currency_weights_are_normalized() {
        let names = ["A".to_string(), "B".to_string()];
        let fractions = Weights::from_parts(&names, &[0.5, 0.5]);
        let dollars = Weights::from_parts(&names, &[500.0, 500.0]);
        let params = RiskParams::default();
        let a = PerformanceStats::compute(&fractions, &table(), Frequency::Weekly, 0.01, RiskMeasure::Mv, &params).unwrap();
        let b = PerformanceStats::compute(&dollars, &table(), Frequency::Weekly, 0.01, RiskMeasure::Mv, &params).unwrap();
        assert_relative_eq!(a.expected_return, b.expected_return, epsilon = 1e-12);
        assert_eq!(a.time_factor, 52.0);
    }

    #[test]
    fn test_second_measure_scaling() {
        let w = Weights::from_parts(&["A".to_string(), "B".to_string()], &[0.5, 0.5]);
        let params = RiskParams::default();

        let cvar = PerformanceStats::compute(&w, &table(), Frequency::Daily, 0.0, RiskMeasure::Cvar, &params)
            .unwrap()
            .risk
            .unwrap();
        // worst portfolio return is -1%, scaled by sqrt(252)
        assert_relative_eq!(cvar.value, 0.01 * 252.0_f64.sqrt(), epsilon = 1e-12);

        let mdd = PerformanceStats::compute(&w, &table(), Frequency::Daily, 0.0, RiskMeasure::Mdd, &params)
            .unwrap()
            .risk
            .unwrap();
        assert_relative_eq!(mdd.value, 0.01, epsilon = 1e-12);
    }
}

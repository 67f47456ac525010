//! Per-asset risk contributions.

use crate::error::Result;
use crate::measure::RiskMeasure;
use crate::scorer::HistoricalRiskScorer;
use portopt_data::ReturnTable;

const STEP: f64 = 1e-6;

/// Contribution `w_i * d risk / d w_i` of every asset.
///
/// MV uses the closed form `w_i (C w)_i / sigma`; other measures use central
/// differences. Contributions of homogeneous measures add up to the risk.
pub fn risk_contributions(
    scorer: &HistoricalRiskScorer,
    returns: &ReturnTable,
    weights: &[f64],
    measure: RiskMeasure,
    rf: f64,
) -> Result<Vec<f64>> {
    let total = scorer.risk(returns, weights, measure, rf)?;

    if measure == RiskMeasure::Mv {
        if total.abs() < f64::EPSILON {
            return Ok(vec![0.0; weights.len()]);
        }
        let cov = returns.covariance();
        let w = ndarray::Array1::from(weights.to_vec());
        let marginal = cov.dot(&w);
        return Ok(weights
            .iter()
            .zip(marginal.iter())
            .map(|(wi, mi)| wi * mi / total)
            .collect());
    }

    let mut bumped = weights.to_vec();
    let mut contributions = Vec::with_capacity(weights.len());
    for i in 0..weights.len() {
        let original = bumped[i];
        bumped[i] = original + STEP;
        let up = scorer.risk(returns, &bumped, measure, rf)?;
        bumped[i] = original - STEP;
        let down = scorer.risk(returns, &bumped, measure, rf)?;
        bumped[i] = original;
        contributions.push(original * (up - down) / (2.0 * STEP));
    }
    Ok(contributions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::RiskParams;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::Array2;
    use rstest::rstest;

    fn table() -> ReturnTable {
        let values = [
            [0.010, 0.020, -0.004],
            [-0.012, 0.004, 0.006],
            [0.007, -0.015, 0.002],
            [0.003, 0.011, -0.009],
            [-0.020, -0.006, 0.012],
            [0.015, 0.009, 0.001],
            [-0.004, 0.013, -0.007],
            [0.008, -0.010, 0.005],
        ];
        let flat: Vec<f64> = values.iter().flatten().copied().collect();
        let dates: Vec<NaiveDate> = (1..=8)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        ReturnTable::new(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            dates,
            Array2::from_shape_vec((8, 3), flat).unwrap(),
        )
        .unwrap()
    }

    #[rstest]
    #[case(RiskMeasure::Mv)]
    #[case(RiskMeasure::Mad)]
    #[case(RiskMeasure::Msv)]
    #[case(RiskMeasure::Mdd)]
    fn test_contributions_add_up(#[case] measure: RiskMeasure) {
        let scorer = HistoricalRiskScorer::new(RiskParams::default());
        let returns = table();
        let w = [0.3, 0.5, 0.2];
        let rc = risk_contributions(&scorer, &returns, &w, measure, 0.0).unwrap();
        let total = scorer.risk(&returns, &w, measure, 0.0).unwrap();
        assert_eq!(rc.len(), 3);
        assert_relative_eq!(rc.iter().sum::<f64>(), total, epsilon = 1e-6);
    }
}

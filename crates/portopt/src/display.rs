//! Console rendering of weights and performance.

use crate::error::Result;
use portopt_data::{Frequency, ReturnTable};
use portopt_output::{PerformanceReport, WeightsTable};
use portopt_risk::{PerformanceStats, RiskMeasure, RiskParams, Weights};
use std::io::Write;

/// Write the weights table; empty weights write nothing.
pub fn display_weights<W: Write + ?Sized>(
    out: &mut W,
    weights: &Weights,
    market_neutral: bool,
) -> Result<()> {
    if let Some(table) = WeightsTable::render(weights, market_neutral) {
        write!(out, "{table}")?;
    }
    Ok(())
}

/// Compute and write the annualized performance of `weights`.
///
/// `rf` is annual. `measure` adds a second risk line when it is not MV.
pub fn portfolio_performance<W: Write + ?Sized>(
    out: &mut W,
    weights: &Weights,
    returns: &ReturnTable,
    measure: RiskMeasure,
    rf: f64,
    params: &RiskParams,
    freq: Frequency,
) -> Result<PerformanceStats> {
    let stats = PerformanceStats::compute(weights, returns, freq, rf, measure, params)?;
    writeln!(out)?;
    write!(out, "{}", PerformanceReport::new(&stats))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::array;

    fn returns() -> ReturnTable {
        let dates = (1..=4)
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
    fn test_empty_weights_write_nothing() {
        let mut out = Vec::new();
        display_weights(&mut out, &Weights::new(), false).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_performance_lines() {
        let weights = Weights::from_parts(&["A".to_string(), "B".to_string()], &[0.5, 0.5]);
        let mut out = Vec::new();
        let stats = portfolio_performance(
            &mut out,
            &weights,
            &returns(),
            RiskMeasure::Mdd,
            0.0,
            &RiskParams::default(),
            Frequency::Daily,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Annual (by 252) expected return"));
        assert!(text.contains("Maximum drawdown uncompounded : "));
        assert!(stats.risk.is_some());
    }
}

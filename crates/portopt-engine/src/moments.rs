//! Estimated moments and the portfolio risk function optimized against them.

use crate::error::{EngineError, Result};
use crate::solver::numeric_gradient;
use ndarray::{Array1, Array2};
use portopt::Estimation;
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::{
    CovarianceMethod, RiskError, RiskMeasure, RiskParams, estimate_covariance, estimate_mean,
    series_risk,
};

/// Per-period expected returns and covariance of the assets.
#[derive(Debug, Clone)]
pub(crate) struct Moments {
    pub(crate) mu: Array1<f64>,
    pub(crate) cov: Array2<f64>,
}

impl Moments {
    pub(crate) fn estimate(returns: &ReturnTable, estimation: &Estimation) -> Result<Self> {
        let mu = estimate_mean(returns.values(), estimation.mean, estimation.d_ewma)?;
        let cov = covariance(returns, estimation.covariance, estimation.d_ewma)?;
        Ok(Self { mu, cov })
    }
}

/// Covariance of `returns`; methods without an estimator are unsupported.
pub(crate) fn covariance(
    returns: &ReturnTable,
    method: CovarianceMethod,
    d_ewma: f64,
) -> Result<Array2<f64>> {
    if returns.n_periods() < 2 {
        return Err(RiskError::InsufficientData {
            required: 2,
            actual: returns.n_periods(),
        }
        .into());
    }
    estimate_covariance(returns.values(), method, d_ewma).map_err(|e| match e {
        RiskError::Unsupported { kind, value } => EngineError::Unsupported { kind, value },
        other => other.into(),
    })
}

/// Convert an annual return to the return frequency.
pub(crate) fn per_period_return(annual: f64, freq: Frequency) -> f64 {
    annual / freq.time_factor()
}

/// Convert an annual risk level of `measure` to the return frequency.
pub(crate) fn per_period_risk(annual: f64, measure: RiskMeasure, freq: Frequency) -> f64 {
    if measure.scales_with_horizon() {
        annual / freq.time_factor().sqrt()
    } else {
        annual
    }
}

/// Risk of a weight vector under one measure.
///
/// MV is the standard deviation under the estimated covariance; every other
/// measure is scored on the historical portfolio series.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RiskFunction<'a> {
    returns: &'a ReturnTable,
    cov: &'a Array2<f64>,
    measure: RiskMeasure,
    rf: f64,
    params: RiskParams,
}

impl<'a> RiskFunction<'a> {
    /// `rf` is the per-period minimum acceptable return.
    pub(crate) fn new(
        returns: &'a ReturnTable,
        cov: &'a Array2<f64>,
        measure: RiskMeasure,
        rf: f64,
        params: RiskParams,
    ) -> Result<Self> {
        params.validate()?;
        if cov.nrows() != returns.n_assets() {
            return Err(EngineError::DimensionMismatch {
                expected: returns.n_assets(),
                actual: cov.nrows(),
            });
        }
        Ok(Self {
            returns,
            cov,
            measure,
            rf,
            params,
        })
    }

    pub(crate) const fn measure(&self) -> RiskMeasure {
        self.measure
    }

    pub(crate) fn value(&self, w: &Array1<f64>) -> f64 {
        match self.measure {
            RiskMeasure::Mv => w.dot(&self.cov.dot(w)).max(0.0).sqrt(),
            measure => {
                let series = self.returns.values().dot(w).to_vec();
                series_risk(&series, measure, self.rf, &self.params)
            }
        }
    }

    pub(crate) fn gradient(&self, w: &Array1<f64>) -> Array1<f64> {
        match self.measure {
            RiskMeasure::Mv => {
                let cw = self.cov.dot(w);
                let sigma = w.dot(&cw).max(0.0).sqrt();
                if sigma < f64::EPSILON {
                    Array1::zeros(w.len())
                } else {
                    cw / sigma
                }
            }
            _ => numeric_gradient(|x| self.value(x), w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::array;

    fn table() -> ReturnTable {
        let dates = (1..=5)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        ReturnTable::new(
            vec!["A".to_string(), "B".to_string()],
            dates,
            array![[0.01, 0.02], [-0.02, 0.01], [0.03, -0.01], [0.00, 0.02], [0.01, -0.02]],
        )
        .unwrap()
    }

    #[test]
    fn test_mv_gradient_matches_numeric() {
        let returns = table();
        let cov = returns.covariance();
        let risk = RiskFunction::new(&returns, &cov, RiskMeasure::Mv, 0.0, RiskParams::default())
            .unwrap();
        let w = array![0.3, 0.7];
        let analytic = risk.gradient(&w);
        let numeric = numeric_gradient(|x| risk.value(x), &w);
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_relative_eq!(a, n, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_unsupported_covariance() {
        let err = covariance(&table(), CovarianceMethod::Gl, 0.94).unwrap_err();
        assert!(matches!(err, EngineError::Unsupported { .. }));
    }

    #[test]
    fn test_per_period_conversions() {
        assert_relative_eq!(per_period_return(0.252, Frequency::Daily), 0.001);
        assert_relative_eq!(per_period_risk(0.2, RiskMeasure::Mdd, Frequency::Daily), 0.2);
        assert_relative_eq!(
            per_period_risk(0.52, RiskMeasure::Mv, Frequency::Weekly),
            0.52 / 52f64.sqrt()
        );
    }
}

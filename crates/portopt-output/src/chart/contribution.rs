//! Risk contribution per asset.

use super::{Chart, ChartError, portfolio_title};
use plotly::{Bar, Trace};
use portopt_data::Frequency;
use portopt_risk::RiskMeasure;

/// Bar chart of per-asset risk contributions.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionChart {
    title: String,
    measure: RiskMeasure,
    tickers: Vec<String>,
    contributions: Vec<f64>,
}

impl ContributionChart {
    /// Contributions are per period; measures that scale with the horizon are
    /// annualized by `sqrt(time factor)`.
    pub fn new(
        tickers: &[String],
        contributions: &[f64],
        measure: RiskMeasure,
        freq: Frequency,
        title: &str,
    ) -> Result<Self, ChartError> {
        if tickers.is_empty() || tickers.len() != contributions.len() {
            return Err(ChartError::Empty("one contribution per ticker is required"));
        }
        let scale = if measure.scales_with_horizon() {
            freq.time_factor().sqrt()
        } else {
            1.0
        };

        Ok(Self {
            title: title.to_string(),
            measure,
            tickers: tickers.to_vec(),
            contributions: contributions.iter().map(|c| c * scale).collect(),
        })
    }

    /// Annualized contributions aligned with the tickers.
    pub fn contributions(&self) -> &[f64] {
        &self.contributions
    }
}

impl Chart for ContributionChart {
    fn name(&self) -> &'static str {
        "rc"
    }

    fn title(&self) -> String {
        portfolio_title(
            &self.title,
            &format!("Risk ({}) Contribution per Asset", self.measure.code()),
        )
    }

    fn traces(&self) -> Vec<Box<dyn Trace>> {
        let bar: Box<dyn Trace> = Bar::new(self.tickers.clone(), self.contributions.clone())
            .name(format!("{} contribution", self.measure.code()));
        vec![bar]
    }
}

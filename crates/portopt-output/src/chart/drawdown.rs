//! Uncompounded drawdown curve with drawdown risk levels.

use super::{Chart, ChartError, RiskMarker, portfolio_title};
use chrono::NaiveDate;
use plotly::common::{DashType, Fill, Line, Mode};
use plotly::{Scatter, Trace};
use portopt_risk::drawdown::{drawdown_risk, drawdowns};
use portopt_risk::{RiskMeasure, RiskParams};

/// Historical drawdown of the cumulative (uncompounded) portfolio returns.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownChart {
    title: String,
    dates: Vec<NaiveDate>,
    drawdowns: Vec<f64>,
    levels: Vec<RiskMarker>,
}

impl DrawdownChart {
    /// Drawdowns of `returns` observed on `dates`, with ADD, DaR, CDaR, EDaR,
    /// MDD and UCI levels at `params.alpha`.
    pub fn new(
        dates: &[NaiveDate],
        returns: &[f64],
        title: &str,
        params: &RiskParams,
    ) -> Result<Self, ChartError> {
        if returns.is_empty() || dates.len() != returns.len() {
            return Err(ChartError::Empty("drawdown needs one date per return"));
        }
        params.validate()?;

        let confidence = 100.0 * (1.0 - params.alpha);
        let measures = [
            (RiskMeasure::Add, "Average Drawdown".to_string()),
            (RiskMeasure::Dar, format!("{confidence:.2}% Confidence DaR")),
            (RiskMeasure::Cdar, format!("{confidence:.2}% Confidence CDaR")),
            (RiskMeasure::Edar, format!("{confidence:.2}% Confidence EDaR")),
            (RiskMeasure::Mdd, "Maximum Drawdown".to_string()),
            (RiskMeasure::Uci, "Ulcer Index".to_string()),
        ];
        let levels = measures
            .into_iter()
            .filter_map(|(measure, name)| {
                drawdown_risk(returns, measure, params).map(|risk| RiskMarker {
                    label: format!("{name}: {:.2}%", 100.0 * risk),
                    value: -risk,
                })
            })
            .collect();

        Ok(Self {
            title: title.to_string(),
            dates: dates.to_vec(),
            drawdowns: drawdowns(returns, false)[1..].to_vec(),
            levels,
        })
    }

    /// Drawdown at every date, non-positive.
    pub fn drawdowns(&self) -> &[f64] {
        &self.drawdowns
    }

    /// Horizontal risk levels as negative drawdowns.
    pub fn levels(&self) -> &[RiskMarker] {
        &self.levels
    }
}

impl Chart for DrawdownChart {
    fn name(&self) -> &'static str {
        "dd"
    }

    fn title(&self) -> String {
        portfolio_title(&self.title, "Historical Uncompounded Drawdown")
    }

    fn traces(&self) -> Vec<Box<dyn Trace>> {
        let x: Vec<String> = self.dates.iter().map(|d| d.to_string()).collect();

        let mut traces: Vec<Box<dyn Trace>> = Vec::with_capacity(self.levels.len() + 1);
        traces.push(
            Scatter::new(x.clone(), self.drawdowns.clone())
                .mode(Mode::Lines)
                .fill(Fill::ToZeroY)
                .name("Drawdown"),
        );
        for level in &self.levels {
            traces.push(
                Scatter::new(x.clone(), vec![level.value; x.len()])
                    .mode(Mode::Lines)
                    .line(Line::new().dash(DashType::Dash))
                    .name(&level.label),
            );
        }
        traces
    }
}

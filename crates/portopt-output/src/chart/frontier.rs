//! Efficient frontier against randomly drawn portfolios.

use super::{Chart, ChartError};
use plotly::common::{Line, Marker, MarkerSymbol, Mode, Title};
use plotly::layout::Axis;
use plotly::{Layout, Scatter, Trace};
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::{HistoricalRiskScorer, RiskMeasure, RiskParams, Weights};

/// Annualized risk and return of one portfolio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierPoint {
    /// Annualized risk (drawdowns are not rescaled)
    pub risk: f64,
    /// Annualized expected return
    pub ret: f64,
    /// `(ret - annual rf) / risk`
    pub ratio: f64,
}

/// Inputs of [`FrontierChart::new`].
#[derive(Debug, Clone, Copy)]
pub struct FrontierInput<'a> {
    /// Periodic returns the portfolios are evaluated on
    pub returns: &'a ReturnTable,
    /// Frontier portfolios from minimum risk to maximum return
    pub frontier: &'a [Weights],
    /// Random portfolios
    pub random: &'a [Weights],
    /// Tangency portfolio
    pub tangency: &'a Weights,
    /// Risk measure on the x axis
    pub measure: RiskMeasure,
    /// Return frequency
    pub freq: Frequency,
    /// Risk free rate per period
    pub rf: f64,
    /// Risk measure parameters
    pub params: RiskParams,
    /// Draw the capital allocation line through the tangency portfolio
    pub capital_allocation_line: bool,
}

/// Efficient frontier chart model.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierChart {
    measure: RiskMeasure,
    frontier: Vec<FrontierPoint>,
    random: Vec<FrontierPoint>,
    tangency: FrontierPoint,
    cal: Option<[(f64, f64); 2]>,
}

impl FrontierChart {
    /// Evaluate every portfolio of `input`.
    pub fn new(input: &FrontierInput<'_>) -> Result<Self, ChartError> {
        if input.frontier.is_empty() {
            return Err(ChartError::Empty("empty efficient frontier"));
        }
        let scorer = HistoricalRiskScorer::new(input.params);
        let tf = input.freq.time_factor();
        let annual_rf = input.rf * tf;

        let evaluate = |weights: &Weights| -> Result<FrontierPoint, ChartError> {
            let w = weights.normalized().aligned(input.returns.tickers());
            let raw = scorer.risk(input.returns, &w, input.measure, input.rf)?;
            let ret = input.returns.mean().dot(&ndarray::Array1::from(w)) * tf;
            let risk = if input.measure.scales_with_horizon() {
                raw * tf.sqrt()
            } else {
                raw
            };
            let ratio = if risk > 0.0 { (ret - annual_rf) / risk } else { 0.0 };
            Ok(FrontierPoint { risk, ret, ratio })
        };

        let frontier = input
            .frontier
            .iter()
            .map(&evaluate)
            .collect::<Result<Vec<_>, _>>()?;
        let random = input
            .random
            .iter()
            .map(&evaluate)
            .collect::<Result<Vec<_>, _>>()?;
        let tangency = evaluate(input.tangency)?;

        let cal = if input.capital_allocation_line && tangency.risk > 0.0 {
            let slope = (tangency.ret - annual_rf) / tangency.risk;
            let top = tangency.ret * 1.5;
            (slope > 0.0).then(|| [(0.0, annual_rf), ((top - annual_rf) / slope, top)])
        } else {
            None
        };

        Ok(Self {
            measure: input.measure,
            frontier,
            random,
            tangency,
            cal,
        })
    }

    /// Frontier points in input order.
    pub fn frontier(&self) -> &[FrontierPoint] {
        &self.frontier
    }

    /// Random portfolio points.
    pub fn random(&self) -> &[FrontierPoint] {
        &self.random
    }

    /// Tangency portfolio point.
    pub const fn tangency(&self) -> FrontierPoint {
        self.tangency
    }

    /// End points of the capital allocation line.
    pub const fn capital_allocation_line(&self) -> Option<[(f64, f64); 2]> {
        self.cal
    }
}

fn unzip(points: &[FrontierPoint]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.risk, p.ret)).unzip()
}

impl Chart for FrontierChart {
    fn name(&self) -> &'static str {
        "ef"
    }

    fn title(&self) -> String {
        format!("Efficient Frontier simulating {} portfolios", self.random.len())
    }

    fn traces(&self) -> Vec<Box<dyn Trace>> {
        let mut traces: Vec<Box<dyn Trace>> = Vec::with_capacity(4);

        let (x, y) = unzip(&self.random);
        let ratios: Vec<String> = self
            .random
            .iter()
            .map(|p| format!("Return / risk: {:.4}", p.ratio))
            .collect();
        traces.push(
            Scatter::new(x, y)
                .mode(Mode::Markers)
                .marker(Marker::new().size(5))
                .text_array(ratios)
                .name("Random portfolios"),
        );

        let (x, y) = unzip(&self.frontier);
        traces.push(
            Scatter::new(x, y)
                .mode(Mode::Lines)
                .line(Line::new().color("blue"))
                .name("Efficient frontier"),
        );

        traces.push(
            Scatter::new(vec![self.tangency.risk], vec![self.tangency.ret])
                .mode(Mode::Markers)
                .marker(Marker::new().symbol(MarkerSymbol::Star).size(16).color("red"))
                .name("Max return/risk portfolio"),
        );

        if let Some([(x0, y0), (x1, y1)]) = self.cal {
            traces.push(
                Scatter::new(vec![x0, x1], vec![y0, y1])
                    .mode(Mode::Lines)
                    .name("Capital Allocation Line"),
            );
        }
        traces
    }

    fn layout(&self) -> Layout {
        Layout::new()
            .title(Title::from(self.title().as_str()))
            .x_axis(Axis::new().title(Title::from(
                format!("Expected Risk - {}", self.measure.name()).as_str(),
            )))
            .y_axis(Axis::new().title(Title::from("Expected Return")))
    }
}

//! Charts drawn for a displayed portfolio.

use crate::collaborators::HierarchicalOptimizer;
use crate::error::Result;
use crate::params::{ChartFlags, HcpParams};
use plotly::Plot;
use portopt_data::{Frequency, ReturnTable};
use portopt_output::{
    ChartSink, ContributionChart, DrawdownChart, HeatmapChart, HistogramChart, PieChart, draw,
};
use portopt_risk::correlation::pearson;
use portopt_risk::{HistoricalRiskScorer, RiskMeasure, RiskParams, Weights, risk_contributions};
use tracing::{debug, warn};

/// A displayed portfolio and the settings its charts are drawn with.
#[derive(Debug, Clone, Copy)]
pub struct PlotInput<'a> {
    /// Allocation, fractions or currency amounts
    pub weights: &'a Weights,
    /// Return table the allocation was built on
    pub returns: &'a ReturnTable,
    /// Portfolio title shown after `Portfolio - `
    pub title: &'a str,
    /// Return frequency
    pub freq: Frequency,
    /// Measure of the risk contribution chart
    pub risk_measure: RiskMeasure,
    /// Annual risk free rate
    pub rf: f64,
    /// Tail parameters of the histogram, drawdown and contribution charts
    pub risk: RiskParams,
}

/// Pie chart of the positive holdings; nothing is drawn when there are none.
pub fn pie_chart_weights(
    weights: &Weights,
    title: &str,
    surface: Option<&mut Plot>,
    sink: &mut dyn ChartSink,
) -> Result<()> {
    match PieChart::new(weights, title) {
        Some(chart) => Ok(draw(&chart, surface, sink)?),
        None => {
            debug!("no positive weights to chart");
            Ok(())
        }
    }
}

/// Draw every chart enabled in `flags`, in the order pie, hist, dd, rc, heat.
///
/// The heat map clusters with Pearson codependence and Ward linkage through
/// `clusterer`; it is skipped with a warning when no tree can be built.
pub fn additional_plots<H: HierarchicalOptimizer + ?Sized>(
    input: &PlotInput<'_>,
    flags: ChartFlags,
    clusterer: &H,
    surface: Option<&mut Plot>,
    sink: &mut dyn ChartSink,
) -> Result<()> {
    let mut surface = surface;
    let fractions = if input.weights.sum().abs() > f64::EPSILON {
        input.weights.normalized()
    } else {
        input.weights.clone()
    };
    let w = fractions.aligned(input.returns.tickers());
    let series = input.returns.portfolio_returns(&w).to_vec();

    if flags.pie {
        pie_chart_weights(input.weights, input.title, surface.as_deref_mut(), sink)?;
    }

    if flags.hist {
        let chart = HistogramChart::new(&series, input.title, &input.risk)?;
        draw(&chart, surface.as_deref_mut(), sink)?;
    }

    if flags.dd {
        let chart = DrawdownChart::new(input.returns.dates(), &series, input.title, &input.risk)?;
        draw(&chart, surface.as_deref_mut(), sink)?;
    }

    if flags.rc_chart {
        let scorer = HistoricalRiskScorer::new(input.risk);
        let rf = input.rf / input.freq.time_factor();
        let contributions =
            risk_contributions(&scorer, input.returns, &w, input.risk_measure, rf)?;
        let chart = ContributionChart::new(
            input.returns.tickers(),
            &contributions,
            input.risk_measure,
            input.freq,
            input.title,
        )?;
        draw(&chart, surface.as_deref_mut(), sink)?;
    }

    if flags.heat {
        let params = HcpParams::default();
        match clusterer.dendrogram(input.returns, &params) {
            Some(tree) => {
                let correlation = pearson(input.returns.values());
                let chart = HeatmapChart::new(&correlation, &tree, input.title)?;
                draw(&chart, surface.as_deref_mut(), sink)?;
            }
            None => warn!("could not cluster the assets, heat map skipped"),
        }
    }

    Ok(())
}

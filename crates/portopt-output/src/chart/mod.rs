//! Chart models and plotly rendering.
//!
//! Every chart is a plain data model built from numeric results. [`draw`]
//! either appends the model's traces to a caller supplied [`Plot`] or builds a
//! standalone plot with the chart's layout and hands it to a [`ChartSink`].

mod contribution;
mod drawdown;
mod frontier;
mod heatmap;
mod histogram;
mod pie;
mod sink;

pub use contribution::ContributionChart;
pub use drawdown::DrawdownChart;
pub use frontier::{FrontierChart, FrontierInput, FrontierPoint};
pub use heatmap::{DendrogramSegment, HeatmapChart};
pub use histogram::{HistogramBin, HistogramChart, RiskMarker};
pub use pie::{PieChart, PieSlice};
pub use sink::{BrowserSink, ChartSink, HtmlDirSink, MemorySink};

use plotly::common::Title;
use plotly::{Layout, Plot, Trace};
use portopt_risk::RiskError;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building or emitting charts.
#[derive(Debug, Error)]
pub enum ChartError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Risk computation error.
    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    /// Nothing to draw.
    #[error("Nothing to plot: {0}")]
    Empty(&'static str),
}

/// A chart that can be rendered with plotly.
pub trait Chart {
    /// Short name, used as the file stem by sinks.
    fn name(&self) -> &'static str;

    /// Chart title.
    fn title(&self) -> String;

    /// Plot traces.
    fn traces(&self) -> Vec<Box<dyn Trace>>;

    /// Layout of a standalone plot.
    fn layout(&self) -> Layout {
        Layout::new().title(Title::from(self.title().as_str()))
    }
}

/// Render `chart` onto `surface` when given, otherwise as a new plot emitted to `sink`.
pub fn draw(
    chart: &dyn Chart,
    surface: Option<&mut Plot>,
    sink: &mut dyn ChartSink,
) -> Result<(), ChartError> {
    match surface {
        Some(plot) => {
            debug!(chart = chart.name(), "drawing on external surface");
            for trace in chart.traces() {
                plot.add_trace(trace);
            }
            Ok(())
        }
        None => {
            let mut plot = Plot::new();
            for trace in chart.traces() {
                plot.add_trace(trace);
            }
            plot.set_layout(chart.layout());
            sink.emit(chart.name(), plot)
        }
    }
}

/// `"Portfolio - <title>"` heading followed by the chart's own subtitle.
pub(crate) fn portfolio_title(title: &str, subtitle: &str) -> String {
    format!("Portfolio - {title}<br>{subtitle}")
}

/// Vertical line from `0` to `top` at `x`.
pub(crate) fn vertical(x: f64, top: f64) -> (Vec<f64>, Vec<f64>) {
    (vec![x, x], vec![0.0, top])
}

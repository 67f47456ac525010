#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/portopt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod export;
pub mod performance;
pub mod report;
pub mod table;

pub use chart::{
    BrowserSink, Chart, ChartError, ChartSink, ContributionChart, DrawdownChart, FrontierChart,
    FrontierInput, HeatmapChart, HistogramChart, HtmlDirSink, MemorySink, PieChart, draw,
};
pub use export::{ExportError, ExportFormat, Exporter};
pub use performance::PerformanceReport;
pub use report::{AllocationReport, ReportBuilder, ReportError, ReportWeight};
pub use table::WeightsTable;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/portopt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod collaborators;
pub mod display;
pub mod error;
pub mod options;
pub mod params;
pub mod plots;
pub mod views;

// Re-export main types from sub-crates
pub use portopt_data as data;
pub use portopt_output as output;
pub use portopt_risk as risk;

pub use collaborators::{
    FrontierGenerator, HierarchicalOptimizer, MeanRiskOptimizer, RiskParityOptimizer,
    WeightBuilder,
};
pub use display::{display_weights, portfolio_performance};
pub use error::{Result, ViewError};
pub use options::{BinsInfo, Codependence, HcpModel, Linkage, Objective, RelaxedVersion};
pub use params::{
    Budget, ChartFlags, DiversificationParams, Estimation, FrontierParams, HcpParams,
    MeanRiskParams, RelaxedRiskParityParams, RiskParityParams, WeightingParams,
};
pub use plots::{PlotInput, additional_plots, pie_chart_weights};
pub use views::{Allocation, NO_SOLUTION, PortfolioViews};

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

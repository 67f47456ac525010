#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/portopt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frontier;
pub mod hierarchical;
pub mod mean_risk;
mod moments;
pub mod risk_parity;
pub mod solver;
pub mod weights;

#[cfg(test)]
mod testing;

pub use error::{EngineError, Result};
pub use frontier::{efficient_frontier, random_portfolios};
pub use hierarchical::{cluster_tree, hcp};
pub use mean_risk::{max_decorrelation, max_diversification, mean_risk};
pub use risk_parity::{relaxed_risk_parity, risk_parity};
pub use solver::SolverConfig;
pub use weights::{equal_weights, property_weights};

/// Implements every optimizer contract of the views with the solvers in
/// this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceEngine {
    config: SolverConfig,
}

impl ReferenceEngine {
    /// Engine with the default solver settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with custom solver settings.
    pub const fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solver settings in use.
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/portopt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod contributions;
pub mod correlation;
pub mod covariance;
pub mod dendrogram;
pub mod drawdown;
pub mod error;
pub mod mean;
pub mod measure;
pub mod performance;
pub mod scorer;
pub mod weights;

pub use contributions::risk_contributions;
pub use covariance::{CovarianceEstimator, CovarianceMethod, estimate_covariance};
pub use dendrogram::{Dendrogram, Merge};
pub use error::{Result, RiskError};
pub use mean::{MeanMethod, estimate_mean};
pub use measure::{RiskMeasure, RiskParams};
pub use performance::{MeasuredRisk, PerformanceStats};
pub use scorer::{HistoricalRiskScorer, series_risk};
pub use weights::Weights;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

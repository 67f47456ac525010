//! Contracts of the optimizers the views delegate to.
//!
//! Every optimizer returns `None` when the problem has no solution for the
//! given parameters; views report that as a single line rather than an error.

use crate::params::{
    DiversificationParams, FrontierParams, HcpParams, MeanRiskParams, RelaxedRiskParityParams,
    RiskParityParams,
};
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::{Dendrogram, Weights};
use std::collections::HashMap;

/// Weighting schemes that need no optimization.
pub trait WeightBuilder {
    /// `value / n` for every ticker.
    fn equal_weights(&self, tickers: &[String], value: f64) -> Weights;

    /// Weights proportional to `property`; `None` when a ticker has no
    /// positive value.
    fn property_weights(
        &self,
        tickers: &[String],
        property: &HashMap<String, f64>,
        value: f64,
    ) -> Option<Weights>;
}

/// Mean-risk family of portfolios.
pub trait MeanRiskOptimizer {
    /// Optimize `params.objective` under `params.risk_measure`.
    fn mean_risk(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &MeanRiskParams,
    ) -> Option<Weights>;

    /// Maximize `w'sigma / sqrt(w'Cw)`.
    fn max_diversification(
        &self,
        returns: &ReturnTable,
        params: &DiversificationParams,
    ) -> Option<Weights>;

    /// Minimize `w'Rw` where `R` is the correlation matrix.
    fn max_decorrelation(
        &self,
        returns: &ReturnTable,
        params: &DiversificationParams,
    ) -> Option<Weights>;
}

/// Risk budgeting portfolios.
pub trait RiskParityOptimizer {
    /// Portfolio whose risk contributions match `params.risk_cont`.
    fn risk_parity(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &RiskParityParams,
    ) -> Option<Weights>;

    /// Relaxed risk parity on the covariance matrix.
    fn relaxed_risk_parity(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &RelaxedRiskParityParams,
    ) -> Option<Weights>;
}

/// Hierarchical clustering portfolios.
pub trait HierarchicalOptimizer {
    /// HRP, HERC or NCO weights.
    fn hcp(&self, returns: &ReturnTable, freq: Frequency, params: &HcpParams) -> Option<Weights>;

    /// Cluster tree of the assets under `params.codependence` and `params.linkage`.
    fn dendrogram(&self, returns: &ReturnTable, params: &HcpParams) -> Option<Dendrogram>;
}

/// Efficient frontier sampling.
pub trait FrontierGenerator {
    /// `params.points` portfolios from minimum risk to maximum return.
    fn efficient_frontier(
        &self,
        returns: &ReturnTable,
        freq: Frequency,
        params: &FrontierParams,
    ) -> Option<Vec<Weights>>;

    /// `n` random fully invested long-only portfolios, reproducible from `seed`.
    fn random_portfolios(&self, tickers: &[String], n: usize, seed: u64) -> Vec<Weights>;
}

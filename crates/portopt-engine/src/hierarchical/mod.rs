//! Hierarchical clustering portfolios (HRP, HERC, NCO).

mod allocation;
mod codependence;
mod linkage;

use crate::ReferenceEngine;
use crate::error::{EngineError, Result, solution};
use crate::mean_risk::{MeanRiskTask, clean, to_weights};
use crate::moments::{Moments, RiskFunction, per_period_return};
use crate::solver::SolverConfig;
use allocation::{NaiveRisk, herc, hrp, nco};
use ndarray::Array2;
use portopt::{Estimation, HcpModel, HcpParams, HierarchicalOptimizer};
use portopt_data::{Frequency, ReturnTable};
use portopt_risk::{Dendrogram, MeanMethod, Weights};
use tracing::debug;

/// Cluster tree of the assets and the distances it was built on.
fn build(returns: &ReturnTable, params: &HcpParams) -> Result<(Dendrogram, Array2<f64>)> {
    if returns.n_periods() < 2 {
        return Err(EngineError::Infeasible(
            "clustering needs at least two periods".to_string(),
        ));
    }
    let dist = codependence::distance_matrix(
        returns.values(),
        params.codependence,
        params.alpha_tail,
    )?;
    let merges = linkage::agglomerate(&dist, params.linkage)?;
    let order = params
        .leaf_order
        .then(|| linkage::ordered_leaves(&merges, &dist));
    let tree = Dendrogram::new(returns.tickers().to_vec(), merges, order)?;
    Ok((tree, dist))
}

/// Cluster tree under `params.codependence` and `params.linkage`.
pub fn cluster_tree(returns: &ReturnTable, params: &HcpParams) -> Result<Dendrogram> {
    build(returns, params).map(|(tree, _)| tree)
}

/// Within-cluster dispersion `sum_c sum_{i,j in c} d_ij / (2 |c|)`.
fn dispersion(dist: &Array2<f64>, assignment: &[usize]) -> f64 {
    let n_clusters = assignment.iter().max().map_or(0, |m| m + 1);
    (0..n_clusters)
        .map(|c| {
            let members: Vec<usize> = (0..assignment.len())
                .filter(|&i| assignment[i] == c)
                .collect();
            let total: f64 = members
                .iter()
                .flat_map(|&i| members.iter().map(move |&j| (i, j)))
                .map(|(i, j)| dist[[i, j]])
                .sum();
            total / (2.0 * members.len().max(1) as f64)
        })
        .sum()
}

/// Number of clusters by the two-difference gap statistic, searched up to
/// `min(max_k, sqrt(n))`.
pub(crate) fn optimal_clusters(tree: &Dendrogram, dist: &Array2<f64>, max_k: usize) -> usize {
    let n = tree.n_leaves();
    let limit = ((n as f64).sqrt().floor() as usize).min(max_k).max(1);
    let w: Vec<f64> = (1..=(limit + 1).min(n))
        .map(|k| dispersion(dist, &tree.cut(k)))
        .collect();

    // w[k - 1] holds the dispersion with k clusters
    (2..=limit)
        .filter(|&k| k < w.len())
        .map(|k| (k, w[k - 2] + w[k] - 2.0 * w[k - 1]))
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(limit, |(k, _)| k)
}

/// HRP, HERC or NCO weights scaled to `params.value`.
pub fn hcp(
    returns: &ReturnTable,
    freq: Frequency,
    params: &HcpParams,
    config: &SolverConfig,
) -> Result<Weights> {
    if params.value <= 0.0 {
        return Err(EngineError::Infeasible(format!(
            "budget must be positive, got {}",
            params.value
        )));
    }
    let (tree, dist) = build(returns, params)?;
    let estimation = Estimation {
        mean: MeanMethod::Hist,
        covariance: params.covariance,
        d_ewma: params.d_ewma,
    };
    let moments = Moments::estimate(returns, &estimation)?;
    let rf = per_period_return(params.rf, freq);
    let risk = RiskFunction::new(returns, &moments.cov, params.risk_measure, rf, params.risk)?;
    let k = params
        .k
        .unwrap_or_else(|| optimal_clusters(&tree, &dist, params.max_k));
    debug!(model = %params.model, clusters = k, "allocating over cluster tree");

    let w = match params.model {
        HcpModel::Hrp => hrp(&tree, &NaiveRisk::new(risk, &moments.cov)),
        HcpModel::Herc => herc(&tree, &NaiveRisk::new(risk, &moments.cov), k),
        HcpModel::Nco => {
            let task = MeanRiskTask {
                objective: params.objective,
                measure: params.risk_measure,
                rf,
                risk: params.risk,
                risk_aversion: params.risk_aversion(),
                min_return: None,
                max_risk: None,
            };
            nco(returns, &moments, &tree, k, task, config)?
        }
    };
    Ok(to_weights(returns, &clean(w), params.value))
}

impl HierarchicalOptimizer for ReferenceEngine {
    fn hcp(&self, returns: &ReturnTable, freq: Frequency, params: &HcpParams) -> Option<Weights> {
        solution(hcp(returns, freq, params, self.config()), params.model.key())
    }

    fn dendrogram(&self, returns: &ReturnTable, params: &HcpParams) -> Option<Dendrogram> {
        solution(cluster_tree(returns, params), "clustering")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{block_returns, sample_returns};
    use approx::assert_relative_eq;
    use portopt::{Codependence, Linkage, Objective};
    use portopt_risk::RiskMeasure;
    use rstest::rstest;

    #[test]
    fn test_tree_groups_blocks() {
        let returns = block_returns();
        let tree = cluster_tree(&returns, &HcpParams::default()).unwrap();
        let assignment = tree.cut(2);
        assert_eq!(assignment[0], assignment[1]);
        assert_eq!(assignment[2], assignment[3]);
        assert_ne!(assignment[0], assignment[2]);
    }

    #[test]
    fn test_gap_statistic_finds_blocks() {
        let returns = block_returns();
        let (tree, dist) = build(&returns, &HcpParams::default()).unwrap();
        assert_eq!(optimal_clusters(&tree, &dist, 10), 2);
    }

    #[test]
    fn test_hrp_splits_between_blocks() {
        let returns = block_returns();
        let w = hcp(
            &returns,
            Frequency::Daily,
            &HcpParams::default(),
            &SolverConfig::default(),
        )
        .unwrap();
        let x = w.aligned(returns.tickers());
        let cov = returns.covariance();

        // inverse variance split inside each block
        let inside = (1.0 / cov[[0, 0]]) / (1.0 / cov[[0, 0]] + 1.0 / cov[[1, 1]]);
        assert_relative_eq!(x[0] / (x[0] + x[1]), inside, epsilon = 1e-9);
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
        // the quieter block receives more capital
        assert!(x[2] + x[3] > x[0] + x[1]);
    }

    #[rstest]
    #[case(HcpModel::Hrp)]
    #[case(HcpModel::Herc)]
    #[case(HcpModel::Nco)]
    fn test_models_fill_budget(#[case] model: HcpModel) {
        let returns = sample_returns();
        let params = HcpParams {
            value: 100.0,
            ..HcpParams::for_model(model)
        };
        let w = hcp(&returns, Frequency::Daily, &params, &SolverConfig::default()).unwrap();
        assert_relative_eq!(w.sum(), 100.0, epsilon = 1e-6);
        assert!(w.iter().all(|(_, v)| v >= 0.0));
    }

    #[rstest]
    #[case(HcpModel::Hrp)]
    #[case(HcpModel::Herc)]
    fn test_quiet_asset_leaves_no_dust(#[case] model: HcpModel) {
        let returns = sample_returns();
        let mut values = returns.values().to_owned();
        values.column_mut(3).mapv_inplace(|r| r * 1e-6);
        let quiet = ReturnTable::new(
            returns.tickers().to_vec(),
            returns.dates().to_vec(),
            values,
        )
        .unwrap();

        let params = HcpParams::for_model(model);
        let w = hcp(&quiet, Frequency::Daily, &params, &SolverConfig::default()).unwrap();
        let x = w.aligned(quiet.tickers());
        assert_relative_eq!(x[3], 1.0, epsilon = 1e-9);
        assert!(x[..3].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_nco_risk_parity_objective() {
        let returns = block_returns();
        let params = HcpParams {
            objective: Objective::Erc,
            k: Some(2),
            ..HcpParams::for_model(HcpModel::Nco)
        };
        let w = hcp(&returns, Frequency::Daily, &params, &SolverConfig::default()).unwrap();
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(Codependence::Spearman, Linkage::Single)]
    #[case(Codependence::AbsPearson, Linkage::Complete)]
    #[case(Codependence::Distance, Linkage::Average)]
    #[case(Codependence::Tail, Linkage::Ward)]
    #[case(Codependence::Pearson, Linkage::Centroid)]
    #[case(Codependence::AbsSpearman, Linkage::Median)]
    fn test_tree_for_every_supported_option(#[case] codependence: Codependence, #[case] linkage: Linkage) {
        let returns = sample_returns();
        let params = HcpParams {
            codependence,
            linkage,
            ..Default::default()
        };
        let tree = cluster_tree(&returns, &params).unwrap();
        assert_eq!(tree.n_leaves(), 4);
        assert_eq!(tree.merges().len(), 3);
    }

    #[test]
    fn test_cvar_hrp() {
        let params = HcpParams {
            risk_measure: RiskMeasure::Cvar,
            ..Default::default()
        };
        let engine = ReferenceEngine::default();
        assert!(engine.hcp(&sample_returns(), Frequency::Daily, &params).is_some());
    }

    #[test]
    fn test_dbht_has_no_tree() {
        let params = HcpParams {
            linkage: Linkage::Dbht,
            ..Default::default()
        };
        assert!(ReferenceEngine::default().dendrogram(&block_returns(), &params).is_none());
    }
}

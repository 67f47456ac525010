//! Allocation rules over a cluster tree.

use crate::error::Result;
use crate::mean_risk::{MeanRiskTask, optimize};
use crate::moments::{Moments, RiskFunction};
use crate::risk_parity::{budgeting, risk_budgets};
use crate::solver::SolverConfig;
use ndarray::{Array1, Array2, Axis};
use portopt::Objective;
use portopt_data::ReturnTable;
use portopt_risk::{Dendrogram, RiskMeasure};

const RISK_FLOOR: f64 = 1e-16;

/// Inverse-risk weights inside a cluster and the risk of the resulting
/// cluster portfolio. MV works with variances.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NaiveRisk<'a> {
    risk: RiskFunction<'a>,
    cov: &'a Array2<f64>,
}

impl<'a> NaiveRisk<'a> {
    pub(crate) const fn new(risk: RiskFunction<'a>, cov: &'a Array2<f64>) -> Self {
        Self { risk, cov }
    }

    fn asset_risk(&self, i: usize) -> f64 {
        if self.risk.measure() == RiskMeasure::Mv {
            return self.cov[[i, i]];
        }
        let mut unit: Array1<f64> = Array1::zeros(self.cov.nrows());
        unit[i] = 1.0;
        self.risk.value(&unit)
    }

    /// Fractions of `members`, proportional to the inverse of their own risk.
    pub(crate) fn inverse_risk(&self, members: &[usize]) -> Vec<f64> {
        let inverse: Vec<f64> = members
            .iter()
            .map(|&i| 1.0 / self.asset_risk(i).max(RISK_FLOOR))
            .collect();
        let total: f64 = inverse.iter().sum();
        inverse.iter().map(|v| v / total).collect()
    }

    pub(crate) fn cluster_risk(&self, members: &[usize]) -> f64 {
        let mut w: Array1<f64> = Array1::zeros(self.cov.nrows());
        for (&i, v) in members.iter().zip(self.inverse_risk(members)) {
            w[i] = v;
        }
        if self.risk.measure() == RiskMeasure::Mv {
            w.dot(&self.cov.dot(&w))
        } else {
            self.risk.value(&w)
        }
    }
}

/// Split capital top-down along the tree by inverse cluster risk until a
/// node satisfies `is_cluster`, then inside it by inverse asset risk.
fn bisect<F>(tree: &Dendrogram, naive: &NaiveRisk<'_>, is_cluster: F) -> Array1<f64>
where
    F: Fn(&[usize]) -> bool,
{
    let mut w: Array1<f64> = Array1::ones(tree.n_leaves());
    let mut stack = vec![tree.root()];

    while let Some(node) = stack.pop() {
        let leaves = tree.leaves_under(node);
        if is_cluster(&leaves) {
            for (&i, v) in leaves.iter().zip(naive.inverse_risk(&leaves)) {
                w[i] *= v;
            }
            continue;
        }
        let Some((left, right)) = tree.children(node) else {
            continue;
        };
        let left_leaves = tree.leaves_under(left);
        let right_leaves = tree.leaves_under(right);
        let rl = naive.cluster_risk(&left_leaves);
        let rr = naive.cluster_risk(&right_leaves);
        let alpha = if (rl + rr).is_finite() && rl + rr > 0.0 {
            1.0 - rl / (rl + rr)
        } else {
            0.5
        };
        for &i in &left_leaves {
            w[i] *= alpha;
        }
        for &i in &right_leaves {
            w[i] *= 1.0 - alpha;
        }
        stack.push(right);
        stack.push(left);
    }

    let total = w.sum();
    w / total
}

/// Hierarchical risk parity: recursive bisection down to single assets.
pub(crate) fn hrp(tree: &Dendrogram, naive: &NaiveRisk<'_>) -> Array1<f64> {
    bisect(tree, naive, |leaves| leaves.len() == 1)
}

/// Hierarchical equal risk contribution: bisection down to the `k` flat
/// clusters, inverse risk inside each.
pub(crate) fn herc(tree: &Dendrogram, naive: &NaiveRisk<'_>, k: usize) -> Array1<f64> {
    let assignment = tree.cut(k);
    bisect(tree, naive, |leaves| {
        leaves
            .split_first()
            .is_none_or(|(first, rest)| rest.iter().all(|l| assignment[*l] == assignment[*first]))
    })
}

/// Flat clusters of `tree` as member lists, by cluster id.
fn clusters(tree: &Dendrogram, k: usize) -> Vec<Vec<usize>> {
    let assignment = tree.cut(k);
    let n_clusters = assignment.iter().max().map_or(0, |m| m + 1);
    let mut groups = vec![Vec::new(); n_clusters];
    for (leaf, &c) in assignment.iter().enumerate() {
        groups[c].push(leaf);
    }
    groups
}

fn solve(
    returns: &ReturnTable,
    moments: &Moments,
    task: MeanRiskTask,
    config: &SolverConfig,
) -> Result<Array1<f64>> {
    if task.objective == Objective::Erc {
        let budgets = risk_budgets(None, returns.n_assets())?;
        budgeting(returns, moments, task.measure, task.rf, task.risk, &budgets, config)
    } else {
        optimize(returns, moments, task, config)
    }
}

/// Nested clustered optimization: optimize inside every cluster, then across
/// the cluster portfolios.
pub(crate) fn nco(
    returns: &ReturnTable,
    moments: &Moments,
    tree: &Dendrogram,
    k: usize,
    task: MeanRiskTask,
    config: &SolverConfig,
) -> Result<Array1<f64>> {
    let groups = clusters(tree, k);
    let mut intra: Array2<f64> = Array2::zeros((returns.n_assets(), groups.len()));

    for (c, members) in groups.iter().enumerate() {
        let w = if members.len() == 1 {
            Array1::ones(1)
        } else {
            let sub = returns.select(members);
            let sub_moments = Moments {
                mu: moments.mu.select(Axis(0), members),
                cov: moments.cov.select(Axis(0), members).select(Axis(1), members),
            };
            solve(&sub, &sub_moments, task, config)?
        };
        for (&i, v) in members.iter().zip(w.iter()) {
            intra[[i, c]] = *v;
        }
    }

    let names = (1..=groups.len()).map(|c| format!("cluster {c}")).collect();
    let cluster_returns = ReturnTable::new(
        names,
        returns.dates().to_vec(),
        returns.values().dot(&intra),
    )?;
    let cluster_moments = Moments {
        mu: intra.t().dot(&moments.mu),
        cov: intra.t().dot(&moments.cov).dot(&intra),
    };
    let inter = solve(&cluster_returns, &cluster_moments, task, config)?;
    Ok(intra.dot(&inter))
}

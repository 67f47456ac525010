//! Agglomerative clustering through the Lance-Williams recurrence.

use crate::error::{EngineError, Result};
use ndarray::Array2;
use portopt::Linkage;
use portopt_risk::Merge;

/// Merge steps of agglomerative clustering on a distance matrix.
///
/// Node ids follow the scipy convention: merge `k` creates node `n + k`, the
/// smaller child id comes first. Ties go to the first pair in row order.
pub(crate) fn agglomerate(dist: &Array2<f64>, method: Linkage) -> Result<Vec<Merge>> {
    if method == Linkage::Dbht {
        return Err(EngineError::unsupported("linkage", method.key()));
    }
    let n = dist.nrows();
    let mut d = dist.to_owned();
    let mut active = vec![true; n];
    let mut ids: Vec<usize> = (0..n).collect();
    let mut sizes = vec![1usize; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for step in 0..n.saturating_sub(1) {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n).filter(|&i| active[i]) {
            for j in (i + 1..n).filter(|&j| active[j]) {
                if best.is_none_or(|(_, _, h)| d[[i, j]] < h) {
                    best = Some((i, j, d[[i, j]]));
                }
            }
        }
        let Some((i, j, height)) = best else {
            break;
        };

        let (ni, nj) = (sizes[i] as f64, sizes[j] as f64);
        for k in (0..n).filter(|&k| active[k] && k != i && k != j) {
            let updated = lance_williams(method, d[[k, i]], d[[k, j]], height, ni, nj, sizes[k] as f64);
            d[[i, k]] = updated;
            d[[k, i]] = updated;
        }

        merges.push(Merge {
            left: ids[i].min(ids[j]),
            right: ids[i].max(ids[j]),
            height,
            size: sizes[i] + sizes[j],
        });
        ids[i] = n + step;
        sizes[i] += sizes[j];
        active[j] = false;
    }
    Ok(merges)
}

/// Distance from cluster `k` to the union of `i` and `j`.
fn lance_williams(method: Linkage, dki: f64, dkj: f64, dij: f64, ni: f64, nj: f64, nk: f64) -> f64 {
    match method {
        Linkage::Single => dki.min(dkj),
        Linkage::Complete => dki.max(dkj),
        Linkage::Average => (ni * dki + nj * dkj) / (ni + nj),
        Linkage::Weighted => (dki + dkj) / 2.0,
        Linkage::Centroid => {
            let nij = ni + nj;
            ((ni * dki * dki + nj * dkj * dkj) / nij - ni * nj * dij * dij / (nij * nij))
                .max(0.0)
                .sqrt()
        }
        Linkage::Median => (dki * dki / 2.0 + dkj * dkj / 2.0 - dij * dij / 4.0)
            .max(0.0)
            .sqrt(),
        Linkage::Ward | Linkage::Dbht => {
            (((ni + nk) * dki * dki + (nj + nk) * dkj * dkj - nk * dij * dij) / (ni + nj + nk))
                .max(0.0)
                .sqrt()
        }
    }
}

/// Leaf order that flips subtrees bottom-up so neighbouring leaves across
/// every merge are as close as possible.
pub(crate) fn ordered_leaves(merges: &[Merge], dist: &Array2<f64>) -> Vec<usize> {
    let n = dist.nrows();
    let mut orders: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    for m in merges {
        let left = &orders[m.left];
        let right = &orders[m.right];
        let candidates = [
            (false, false),
            (true, false),
            (false, true),
            (true, true),
        ];
        let seam = |flip_left: bool, flip_right: bool| {
            let a = if flip_left { left.first() } else { left.last() };
            let b = if flip_right { right.last() } else { right.first() };
            match (a, b) {
                (Some(&a), Some(&b)) => dist[[a, b]],
                _ => f64::INFINITY,
            }
        };
        let (flip_left, flip_right) = candidates
            .into_iter()
            .min_by(|x, y| seam(x.0, x.1).total_cmp(&seam(y.0, y.1)))
            .unwrap_or((false, false));

        let mut joined: Vec<usize> = if flip_left {
            left.iter().rev().copied().collect()
        } else {
            left.clone()
        };
        if flip_right {
            joined.extend(right.iter().rev());
        } else {
            joined.extend(right.iter());
        }
        orders.push(joined);
    }
    orders.pop().unwrap_or_default()
}

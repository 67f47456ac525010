//! Codependence matrices and the distances clustered on.

use crate::error::{EngineError, Result};
use ndarray::Array2;
use portopt::Codependence;
use portopt_risk::correlation::{distance_correlation, pearson, spearman};

const TAIL_FLOOR: f64 = 1e-8;

/// Distance matrix between the columns of `values`.
///
/// Signed correlations map to `sqrt((1 - rho) / 2)`, absolute and distance
/// correlations to `sqrt(1 - rho)` and lower tail dependence to `-ln(rho)`.
pub(crate) fn distance_matrix(
    values: &Array2<f64>,
    codependence: Codependence,
    alpha_tail: f64,
) -> Result<Array2<f64>> {
    let mut dist = match codependence {
        Codependence::Pearson => signed_distance(&pearson(values)),
        Codependence::Spearman => signed_distance(&spearman(values)),
        Codependence::AbsPearson => absolute_distance(&pearson(values).mapv(f64::abs)),
        Codependence::AbsSpearman => absolute_distance(&spearman(values).mapv(f64::abs)),
        Codependence::Distance => absolute_distance(&distance_correlation(values)),
        Codependence::Tail => {
            lower_tail_dependence(values, alpha_tail)?.mapv(|c| -c.max(TAIL_FLOOR).ln())
        }
        Codependence::MutualInfo => {
            return Err(EngineError::unsupported(
                "codependence",
                codependence.key(),
            ));
        }
    };
    dist.diag_mut().fill(0.0);
    Ok(dist)
}

fn signed_distance(corr: &Array2<f64>) -> Array2<f64> {
    corr.mapv(|c| ((1.0 - c) / 2.0).clamp(0.0, 1.0).sqrt())
}

fn absolute_distance(codep: &Array2<f64>) -> Array2<f64> {
    codep.mapv(|c| (1.0 - c).clamp(0.0, 1.0).sqrt())
}

/// Share of the `ceil(alpha T)` worst periods of one asset that are also
/// among the worst periods of the other.
pub(crate) fn lower_tail_dependence(values: &Array2<f64>, alpha: f64) -> Result<Array2<f64>> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(EngineError::Infeasible(format!(
            "tail significance must be within (0, 1), got {alpha}"
        )));
    }
    let (t, n) = values.dim();
    let k = ((t as f64) * alpha).ceil().max(1.0) as usize;
    if k > t {
        return Err(EngineError::Infeasible("not enough periods for the tail".to_string()));
    }

    let in_tail: Vec<Vec<bool>> = values
        .columns()
        .into_iter()
        .map(|column| {
            let mut sorted = column.to_vec();
            sorted.sort_unstable_by(f64::total_cmp);
            let cutoff = sorted[k - 1];
            column.iter().map(|&x| x <= cutoff).collect()
        })
        .collect();

    Ok(Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else {
            let joint = in_tail[i]
                .iter()
                .zip(&in_tail[j])
                .filter(|(a, b)| **a && **b)
                .count();
            (joint as f64 / k as f64).min(1.0)
        }
    }))
}

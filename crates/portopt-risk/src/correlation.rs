//! Correlation matrices used as codependence measures.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Convert a covariance matrix to a correlation matrix.
///
/// Assets with zero variance get zero correlation with every other asset
/// and one on the diagonal.
pub fn cov_to_corr(cov: &Array2<f64>) -> Array2<f64> {
    let n = cov.nrows();
    let std: Array1<f64> = cov.diag().mapv(f64::sqrt);
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else if std[i] > 0.0 && std[j] > 0.0 {
            (cov[[i, j]] / (std[i] * std[j])).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    })
}

/// Pearson correlation of the columns of `values`.
pub fn pearson(values: &Array2<f64>) -> Array2<f64> {
    let n = values.nrows();
    if n < 2 {
        return Array2::eye(values.ncols());
    }
    let mean = values
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(values.ncols()));
    let centered = values - &mean.insert_axis(Axis(0));
    cov_to_corr(&(centered.t().dot(&centered) / (n as f64 - 1.0)))
}

/// Spearman rank correlation of the columns of `values`.
pub fn spearman(values: &Array2<f64>) -> Array2<f64> {
    let mut ranked = values.clone();
    for mut column in ranked.columns_mut() {
        let r = ranks(column.view());
        column.assign(&r);
    }
    pearson(&ranked)
}

/// Ranks starting at 1, ties get their average rank.
fn ranks(x: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = x.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

    let mut out: Array1<f64> = Array1::zeros(n);
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && x[order[j + 1]] == x[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            out[order[k]] = rank;
        }
        i = j + 1;
    }
    out
}

/// Distance correlation matrix (Székely) of the columns of `values`.
pub fn distance_correlation(values: &Array2<f64>) -> Array2<f64> {
    let m = values.ncols();
    let centered: Vec<Array2<f64>> = values.columns().into_iter().map(double_centered).collect();
    let dcov = |a: &Array2<f64>, b: &Array2<f64>| (a * b).mean().unwrap_or(0.0).max(0.0).sqrt();
    let dvar: Vec<f64> = centered.iter().map(|a| dcov(a, a)).collect();

    let mut out: Array2<f64> = Array2::eye(m);
    for i in 0..m {
        for j in (i + 1)..m {
            let denom = (dvar[i] * dvar[j]).sqrt();
            let value = if denom > 0.0 {
                dcov(&centered[i], &centered[j]) / denom
            } else {
                0.0
            };
            out[[i, j]] = value;
            out[[j, i]] = value;
        }
    }
    out
}

fn double_centered(x: ArrayView1<'_, f64>) -> Array2<f64> {
    let n = x.len();
    let d = Array2::from_shape_fn((n, n), |(i, j)| (x[i] - x[j]).abs());
    let row_mean = d.mean_axis(Axis(1)).unwrap_or_else(|| Array1::zeros(n));
    let col_mean = d.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n));
    let grand = d.mean().unwrap_or(0.0);
    Array2::from_shape_fn((n, n), |(i, j)| d[[i, j]] - row_mean[i] - col_mean[j] + grand)
}

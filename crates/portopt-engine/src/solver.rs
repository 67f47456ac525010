//! Projected gradient descent over the long-only budget simplex.
//!
//! Each step moves against the gradient and projects back onto the feasible
//! set; the step length is found by Armijo backtracking on the projected arc.
//! A minimum portfolio return is enforced exactly: the projection onto the
//! simplex cut by `mu'w >= r` is the simplex projection of `v + lambda mu`
//! for the smallest multiplier `lambda >= 0` that meets the return.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::trace;

const FD_STEP: f64 = 1e-6;
const MIN_STEP: f64 = 1e-14;
const MAX_STEP: f64 = 1e8;
const BISECT_ITER: usize = 200;

/// Settings of the projected gradient solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Iteration cap
    pub max_iter: usize,
    /// Stop once an iteration moves the weights less than this (L1)
    pub tol: f64,
    /// Sufficient decrease constant of the Armijo rule
    pub armijo: f64,
    /// Step shrink factor while backtracking
    pub backtrack: f64,
    /// Weight of the quadratic penalty on a target risk breach
    pub penalty: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 3000,
            tol: 1e-10,
            armijo: 1e-4,
            backtrack: 0.5,
            penalty: 1e4,
        }
    }
}

/// A smooth (or almost smooth) function of the weights.
pub(crate) trait Problem {
    fn value(&self, w: &Array1<f64>) -> f64;

    fn gradient(&self, w: &Array1<f64>) -> Array1<f64> {
        numeric_gradient(|x| self.value(x), w)
    }
}

/// Central difference gradient.
pub(crate) fn numeric_gradient<F>(f: F, w: &Array1<f64>) -> Array1<f64>
where
    F: Fn(&Array1<f64>) -> f64,
{
    let mut x = w.clone();
    let mut g: Array1<f64> = Array1::zeros(w.len());
    for i in 0..w.len() {
        let original = x[i];
        x[i] = original + FD_STEP;
        let up = f(&x);
        x[i] = original - FD_STEP;
        let down = f(&x);
        x[i] = original;
        g[i] = (up - down) / (2.0 * FD_STEP);
    }
    g
}

/// Where the weights may live.
#[derive(Debug, Clone)]
pub(crate) enum FeasibleSet {
    /// `w >= 0`, `sum(w) = total`
    Simplex { total: f64 },
    /// Simplex intersected with `mu'w >= min_return`
    SimplexMinReturn {
        total: f64,
        mu: Array1<f64>,
        min_return: f64,
    },
    /// `w >= floor` componentwise
    Positive { floor: f64 },
}

impl FeasibleSet {
    pub(crate) fn simplex(total: f64) -> Self {
        Self::Simplex { total }
    }

    /// Add a minimum return to a simplex; `None` keeps the plain simplex.
    pub(crate) fn with_min_return(self, mu: &Array1<f64>, min_return: Option<f64>) -> Self {
        match (self, min_return) {
            (Self::Simplex { total }, Some(min_return)) => Self::SimplexMinReturn {
                total,
                mu: mu.clone(),
                min_return,
            },
            (set, _) => set,
        }
    }

    /// Whether some point satisfies every constraint.
    pub(crate) fn is_attainable(&self) -> bool {
        match self {
            Self::SimplexMinReturn {
                total,
                mu,
                min_return,
            } => mu.fold(f64::NEG_INFINITY, |m, &v| m.max(v)) * total >= *min_return - 1e-12,
            Self::Simplex { total } => *total > 0.0,
            Self::Positive { .. } => true,
        }
    }

    pub(crate) fn project(&self, v: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Simplex { total } => project_simplex(v, *total),
            Self::SimplexMinReturn {
                total,
                mu,
                min_return,
            } => project_simplex_min_return(v, *total, mu, *min_return),
            Self::Positive { floor } => v.mapv(|x| x.max(*floor)),
        }
    }
}

/// Euclidean projection onto `{w >= 0, sum(w) = total}`.
pub(crate) fn project_simplex(v: &Array1<f64>, total: f64) -> Array1<f64> {
    let mut u = v.to_vec();
    u.sort_unstable_by(|a, b| b.total_cmp(a));

    let mut cumsum = 0.0;
    let mut theta = 0.0;
    for (j, &uj) in u.iter().enumerate() {
        cumsum += uj;
        let candidate = (cumsum - total) / (j + 1) as f64;
        if uj - candidate > 0.0 {
            theta = candidate;
        }
    }
    v.mapv(|x| (x - theta).max(0.0))
}

/// Euclidean projection onto `{w >= 0, sum(w) = total, mu'w >= min_return}`.
///
/// The result meets the return whenever the set is attainable.
pub(crate) fn project_simplex_min_return(
    v: &Array1<f64>,
    total: f64,
    mu: &Array1<f64>,
    min_return: f64,
) -> Array1<f64> {
    let at = |lambda: f64| project_simplex(&(v + &(mu * lambda)), total);

    let mut w_hi = at(0.0);
    if mu.dot(&w_hi) >= min_return {
        return w_hi;
    }

    let best = mu.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
    let mut hi = 1.0;
    w_hi = at(hi);
    while mu.dot(&w_hi) < min_return {
        if w_hi.iter().zip(mu).all(|(&w, &m)| w == 0.0 || m == best) {
            return best_face(v, total, mu, best);
        }
        hi *= 2.0;
        w_hi = at(hi);
    }

    let mut lo = 0.0;
    for _ in 0..BISECT_ITER {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let w_mid = at(mid);
        if mu.dot(&w_mid) >= min_return {
            hi = mid;
            w_hi = w_mid;
        } else {
            lo = mid;
        }
    }
    w_hi
}

/// Simplex projection of `v` restricted to the assets with the best return.
fn best_face(v: &Array1<f64>, total: f64, mu: &Array1<f64>, best: f64) -> Array1<f64> {
    let masked = Array1::from_iter(
        v.iter()
            .zip(mu)
            .map(|(&x, &m)| if m == best { x } else { f64::NEG_INFINITY }),
    );
    project_simplex(&masked, total)
}

/// Minimize `problem` over `set`, starting from the projection of `start`.
///
/// The objective never increases from one iterate to the next.
pub(crate) fn minimize<P: Problem + ?Sized>(
    problem: &P,
    start: &Array1<f64>,
    set: &FeasibleSet,
    config: &SolverConfig,
) -> Array1<f64> {
    let mut x = set.project(start);
    let mut fx = problem.value(&x);
    let mut step = 1.0;

    for iter in 0..config.max_iter {
        let g = problem.gradient(&x);
        let mut t = step;

        let accepted = loop {
            let candidate = set.project(&(&x - &(&g * t)));
            let d = &candidate - &x;
            let fc = problem.value(&candidate);
            if fc.is_finite() && fc <= fx - config.armijo / t * d.dot(&d) {
                break Some((candidate, fc, d));
            }
            t *= config.backtrack;
            if t < MIN_STEP {
                break None;
            }
        };

        let Some((next, f_next, d)) = accepted else {
            trace!(iter, value = fx, "no descent step left");
            return x;
        };

        let moved = d.mapv(f64::abs).sum();
        let improvement = fx - f_next;
        x = next;
        fx = f_next;
        if moved < config.tol || improvement <= f64::EPSILON * (1.0 + fx.abs()) {
            trace!(iter, value = fx, "converged");
            return x;
        }
        step = (t * 2.0).min(MAX_STEP);
    }

    trace!(value = fx, "iteration limit reached");
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Quadratic {
        target: Array1<f64>,
    }

    impl Problem for Quadratic {
        fn value(&self, w: &Array1<f64>) -> f64 {
            let d = w - &self.target;
            d.dot(&d)
        }
    }

    #[test]
    fn test_simplex_projection() {
        let p = project_simplex(&array![0.5, 0.5, 0.5], 1.0);
        for v in p.iter() {
            assert_relative_eq!(*v, 1.0 / 3.0, epsilon = 1e-12);
        }

        let p = project_simplex(&array![2.0, -1.0, 0.0], 1.0);
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 0.0);
        assert_relative_eq!(p[2], 0.0);
    }

    #[test]
    fn test_simplex_projection_keeps_budget() {
        let p = project_simplex(&array![0.3, 0.9, -0.2, 0.4], 1000.0);
        assert_relative_eq!(p.sum(), 1000.0, epsilon = 1e-9);
        assert!(p.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_min_return_projection_is_exact() {
        let mu = array![0.001, 0.002, 0.0035];
        let target = 0.003;
        let w = project_simplex_min_return(&array![0.6, 0.3, 0.1], 1.0, &mu, target);
        assert!(mu.dot(&w) >= target);
        assert_relative_eq!(mu.dot(&w), target, epsilon = 1e-12);
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|&x| x >= 0.0));

        let inside = project_simplex_min_return(&array![0.0, 0.0, 1.0], 1.0, &mu, target);
        assert_relative_eq!(inside[2], 1.0);

        let top = project_simplex_min_return(&array![1.0, 0.0, 0.0], 1.0, &mu, 0.0035);
        assert_relative_eq!(mu.dot(&top), 0.0035, epsilon = 1e-12);
    }

    #[test]
    fn test_minimize_quadratic_on_simplex() {
        let problem = Quadratic {
            target: array![0.8, 0.4, -0.2],
        };
        let set = FeasibleSet::simplex(1.0);
        let w = minimize(&problem, &array![1.0, 1.0, 1.0], &set, &SolverConfig::default());
        assert_relative_eq!(w[0], 0.7, epsilon = 1e-6);
        assert_relative_eq!(w[1], 0.3, epsilon = 1e-6);
        assert_relative_eq!(w[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_minimize_with_min_return() {
        let problem = Quadratic {
            target: array![0.5, 0.5],
        };
        let mu = array![0.01, 0.03];
        let set = FeasibleSet::simplex(1.0).with_min_return(&mu, Some(0.025));
        assert!(set.is_attainable());
        let w = minimize(&problem, &array![0.5, 0.5], &set, &SolverConfig::default());
        assert!(mu.dot(&w) >= 0.025 - 1e-12);
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unattainable_return() {
        let mu = array![0.01, 0.02];
        let set = FeasibleSet::simplex(1.0).with_min_return(&mu, Some(0.05));
        assert!(!set.is_attainable());
    }
}

//! Histogram of portfolio returns with risk markers.

use super::{Chart, ChartError, portfolio_title, vertical};
use plotly::common::{DashType, Line, Mode};
use plotly::{Bar, Scatter, Trace};
use portopt_risk::RiskParams;
use portopt_risk::scorer::{cvar_hist, evar_hist, std_dev, tail_gini, var_hist};

const BINS: usize = 50;

/// Histogram bin with density scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    /// Bin center
    pub center: f64,
    /// Bin width
    pub width: f64,
    /// Observations in the bin divided by `n * width`
    pub density: f64,
}

/// A labelled vertical line at a return level.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskMarker {
    /// Legend label
    pub label: String,
    /// Return level
    pub value: f64,
}

/// Density histogram of the portfolio return series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramChart {
    title: String,
    bins: Vec<HistogramBin>,
    markers: Vec<RiskMarker>,
}

impl HistogramChart {
    /// Bin `returns` and compute the mean, deviation and tail markers at
    /// `params.alpha`.
    pub fn new(returns: &[f64], title: &str, params: &RiskParams) -> Result<Self, ChartError> {
        if returns.len() < 2 {
            return Err(ChartError::Empty("histogram needs at least two returns"));
        }
        params.validate()?;

        let alpha = params.alpha;
        let confidence = 100.0 * (1.0 - alpha);
        let mu = returns.iter().sum::<f64>() / returns.len() as f64;
        let sigma = std_dev(returns);
        let worst = returns.iter().copied().fold(f64::INFINITY, f64::min);

        let levels = [
            ("Mean".to_string(), mu),
            ("Mean - Std. Dev.".to_string(), mu - sigma),
            ("Mean - 2 Std. Dev.".to_string(), mu - 2.0 * sigma),
            (format!("{confidence:.2}% Confidence VaR"), -var_hist(returns, alpha)),
            (format!("{confidence:.2}% Confidence CVaR"), -cvar_hist(returns, alpha)),
            (
                format!("{confidence:.2}% Confidence Tail Gini"),
                -tail_gini(returns, alpha, params.a_sim),
            ),
            (format!("{confidence:.2}% Confidence EVaR"), -evar_hist(returns, alpha)),
            ("Worst Realization".to_string(), worst),
        ];
        let markers = levels
            .into_iter()
            .map(|(name, value)| RiskMarker {
                label: format!("{name}: {:.2}%", 100.0 * value),
                value,
            })
            .collect();

        Ok(Self {
            title: title.to_string(),
            bins: histogram(returns, BINS),
            markers,
        })
    }

    /// Histogram bins, left to right.
    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// Risk markers.
    pub fn markers(&self) -> &[RiskMarker] {
        &self.markers
    }
}

fn histogram(x: &[f64], bins: usize) -> Vec<HistogramBin> {
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, width) = if hi > lo {
        (lo, (hi - lo) / bins as f64)
    } else {
        (lo - 0.5e-4, 1e-4 / bins as f64)
    };

    let mut counts = vec![0usize; bins];
    for v in x {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let n = x.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| HistogramBin {
            center: lo + (i as f64 + 0.5) * width,
            width,
            density: c as f64 / (n * width),
        })
        .collect()
}

impl Chart for HistogramChart {
    fn name(&self) -> &'static str {
        "hist"
    }

    fn title(&self) -> String {
        portfolio_title(&self.title, "Portfolio Returns Histogram")
    }

    fn traces(&self) -> Vec<Box<dyn Trace>> {
        let centers: Vec<f64> = self.bins.iter().map(|b| b.center).collect();
        let densities: Vec<f64> = self.bins.iter().map(|b| b.density).collect();
        let top = densities.iter().copied().fold(0.0, f64::max) * 1.05;

        let mut traces: Vec<Box<dyn Trace>> = Vec::with_capacity(self.markers.len() + 1);
        traces.push(Bar::new(centers, densities).name("Portfolio returns"));
        for marker in &self.markers {
            let (x, y) = vertical(marker.value, top);
            traces.push(
                Scatter::new(x, y)
                    .mode(Mode::Lines)
                    .line(Line::new().dash(DashType::Dash))
                    .name(&marker.label),
            );
        }
        traces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RETURNS: [f64; 10] = [
        0.01, -0.02, 0.015, 0.003, -0.007, 0.012, -0.03, 0.02, 0.0, 0.005,
    ];

    #[test]
    fn test_density_integrates_to_one() {
        let chart = HistogramChart::new(&RETURNS, "x", &RiskParams::default()).unwrap();
        assert_eq!(chart.bins().len(), BINS);
        let area: f64 = chart.bins().iter().map(|b| b.density * b.width).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_markers() {
        let chart = HistogramChart::new(&RETURNS, "x", &RiskParams::default()).unwrap();
        let markers = chart.markers();
        assert_eq!(markers.len(), 8);
        assert_relative_eq!(markers[0].value, 0.0008, epsilon = 1e-12);
        assert!(markers[3].label.starts_with("95.00% Confidence VaR"));
        assert_relative_eq!(markers[7].value, -0.03, epsilon = 1e-12);
        assert_eq!(markers[7].label, "Worst Realization: -3.00%");
    }

    #[test]
    fn test_constant_series() {
        let chart = HistogramChart::new(&[0.01; 5], "x", &RiskParams::default()).unwrap();
        let total: f64 = chart.bins().iter().map(|b| b.density * b.width).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_too_short() {
        assert!(HistogramChart::new(&[0.01], "x", &RiskParams::default()).is_err());
    }
}

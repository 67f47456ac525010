//! Portfolio composition pie.

use super::{Chart, portfolio_title};
use plotly::{Pie, Trace};
use portopt_risk::Weights;
use portopt_risk::weights::is_close;

/// One slice of the composition pie.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    /// Ticker
    pub ticker: String,
    /// Amount allocated
    pub value: f64,
    /// Percentage of the plotted total
    pub share: f64,
    /// Text drawn on the slice, empty when the slice is too small
    pub text: String,
    /// Legend entry
    pub legend: String,
}

/// Pie of the positive amounts of an allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    title: String,
    slices: Vec<PieSlice>,
    normalized: bool,
}

impl PieChart {
    /// Build the pie; `None` when no amount is positive.
    ///
    /// Fractional allocations label slices above 4% with their percentage.
    /// Currency allocations label slices above 5% of the total with their amount.
    pub fn new(weights: &Weights, title: &str) -> Option<Self> {
        let positive: Vec<(&str, f64)> = weights.iter().filter(|(_, v)| *v > 0.0).collect();
        if positive.is_empty() {
            return None;
        }

        let total: f64 = positive.iter().map(|(_, v)| v).sum();
        let normalized = is_close(total, 1.0, 0.1);

        let slices = positive
            .into_iter()
            .map(|(ticker, value)| {
                let share = 100.0 * value / total;
                let text = if normalized {
                    if share > 4.0 {
                        format!("{share:.2} %")
                    } else {
                        String::new()
                    }
                } else if value / total > 0.05 {
                    format!("{value:.2}")
                } else {
                    String::new()
                };
                PieSlice {
                    ticker: ticker.to_string(),
                    value,
                    share,
                    text,
                    legend: format!("{ticker} {share:.2}%"),
                }
            })
            .collect();

        Some(Self {
            title: title.to_string(),
            slices,
            normalized,
        })
    }

    /// Plotted slices in allocation order.
    pub fn slices(&self) -> &[PieSlice] {
        &self.slices
    }

    /// Whether the amounts are fractions of capital.
    pub const fn is_normalized(&self) -> bool {
        self.normalized
    }
}

impl Chart for PieChart {
    fn name(&self) -> &'static str {
        "pie"
    }

    fn title(&self) -> String {
        portfolio_title(&self.title, "Portfolio Composition")
    }

    fn traces(&self) -> Vec<Box<dyn Trace>> {
        let values: Vec<f64> = self.slices.iter().map(|s| s.value).collect();
        let labels: Vec<String> = self.slices.iter().map(|s| s.legend.clone()).collect();
        let texts: Vec<String> = self.slices.iter().map(|s| s.text.clone()).collect();

        let pie: Box<dyn Trace> = Pie::new(values)
            .labels(labels)
            .text_array(texts)
            .text_info("text")
            .name("Composition");
        vec![pie]
    }
}

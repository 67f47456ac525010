//! Console table of portfolio weights.

use portopt_risk::Weights;
use prettytable::format::{self, Alignment};
use prettytable::{Cell, Row, Table};
use std::fmt;

/// Weights formatted for the console.
///
/// Long-only allocations whose amounts sum to about one are shown as
/// percentages, other long-only allocations as currency amounts. Market
/// neutral allocations show the raw amounts and encode the unit in the header.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightsTable {
    header: String,
    rows: Vec<(String, String)>,
}

impl WeightsTable {
    /// Title printed above the table.
    pub const TITLE: &'static str = "Weights";

    /// Format `weights`; `None` when there is nothing to show.
    pub fn new(weights: &Weights, market_neutral: bool) -> Option<Self> {
        if weights.is_empty() {
            return None;
        }

        let (header, rows) = if market_neutral {
            let header = if weights.mean_abs() > 1.01 {
                "Value ($)"
            } else {
                "Value (%)"
            };
            let rows = weights
                .iter()
                .map(|(t, v)| (t.to_string(), format!("{v:.4}")))
                .collect();
            (header, rows)
        } else if weights.is_normalized() {
            let rows = weights
                .iter()
                .map(|(t, v)| (t.to_string(), format!("{:.2} %", v * 100.0)))
                .collect();
            ("Value", rows)
        } else {
            let rows = weights
                .iter()
                .map(|(t, v)| (t.to_string(), format!("{v:.2} $")))
                .collect();
            ("Value", rows)
        };

        Some(Self {
            header: header.to_string(),
            rows,
        })
    }

    /// Render `weights` as a titled table; `None` when there is nothing to show.
    pub fn render(weights: &Weights, market_neutral: bool) -> Option<String> {
        Self::new(weights, market_neutral).map(|t| t.to_string())
    }

    /// Column header of the value column.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// `(ticker, formatted value)` rows in allocation order.
    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(Row::new(vec![
            Cell::new(""),
            Cell::new_align(&self.header, Alignment::RIGHT),
        ]));
        for (ticker, value) in &self.rows {
            table.add_row(Row::new(vec![
                Cell::new(ticker),
                Cell::new_align(value, Alignment::RIGHT),
            ]));
        }
        table
    }
}

impl fmt::Display for WeightsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", Self::TITLE)?;
        write!(f, "{}", self.table())
    }
}

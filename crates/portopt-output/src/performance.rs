//! Console performance report.

use portopt_risk::PerformanceStats;
use std::fmt;

/// Text lines describing annualized performance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceReport {
    lines: Vec<String>,
}

impl PerformanceReport {
    /// Format `stats`.
    pub fn new(stats: &PerformanceStats) -> Self {
        let tf = stats.time_factor;
        let mut lines = vec![
            format!(
                "Annual (by {tf:.0}) expected return: {:.2}%",
                100.0 * stats.expected_return
            ),
            format!(
                "Annual (by √{tf:.0}) volatility: {:.2}%",
                100.0 * stats.volatility
            ),
            format!("Sharpe ratio: {:.4}", stats.sharpe),
        ];

        if let Some(risk) = &stats.risk {
            let name = risk.measure.name();
            if risk.measure.is_drawdown() {
                lines.push(format!("{} : {:.2}%", capitalize(name), 100.0 * risk.value));
            } else {
                lines.push(format!(
                    "Annual (by √{tf:.0}) {name} : {:.2}%",
                    100.0 * risk.value
                ));
            }
            lines.push(format!("Return / {name} ratio: {:.4}", risk.ratio));
        }

        Self { lines }
    }

    /// Report lines in print order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// First character upper case, the rest lower case.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

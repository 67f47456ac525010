//! Machine-readable summary of an optimized allocation.

use crate::export::{ExportError, ExportFormat, Exporter, metric_records, to_csv, weight_records};
use chrono::{DateTime, Utc};
use portopt_risk::{PerformanceStats, Weights};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The report has no allocation.
    #[error("report has no weights")]
    MissingWeights,
}

/// One allocation entry of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWeight {
    /// Asset ticker.
    pub ticker: String,

    /// Weight or currency amount.
    pub weight: f64,
}

/// An optimized allocation with its performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Title of the optimization, e.g. "Max Sharpe".
    pub title: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Allocation in ticker order.
    pub weights: Vec<ReportWeight>,

    /// Annualized performance, when computed.
    pub performance: Option<PerformanceStats>,
}

impl AllocationReport {
    /// Create a report stamped with the current time.
    pub fn new(title: String, weights: &Weights, performance: Option<PerformanceStats>) -> Self {
        Self {
            title,
            timestamp: Utc::now(),
            weights: weight_records(weights)
                .into_iter()
                .map(|r| ReportWeight {
                    ticker: r.ticker,
                    weight: r.weight,
                })
                .collect(),
            performance,
        }
    }

    /// Allocation as [`Weights`].
    pub fn allocation(&self) -> Weights {
        self.weights
            .iter()
            .map(|w| (w.ticker.clone(), w.weight))
            .collect()
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Exporter for AllocationReport {
    /// CSV holds the weights followed by the performance figures, one
    /// `name,value` row each.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut rows: Vec<(String, f64)> = self
                    .weights
                    .iter()
                    .map(|w| (w.ticker.clone(), w.weight))
                    .collect();
                if let Some(stats) = &self.performance {
                    rows.extend(metric_records(stats).into_iter().map(|r| (r.metric, r.value)));
                }
                let mut csv = String::from("name,value\n");
                csv.push_str(&to_csv(&rows)?);
                Ok(csv)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    weights: Option<Weights>,
    performance: Option<PerformanceStats>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the allocation.
    pub fn weights(mut self, weights: Weights) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Set the performance statistics.
    pub const fn performance(mut self, stats: PerformanceStats) -> Self {
        self.performance = Some(stats);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<AllocationReport, ReportError> {
        let weights = self.weights.ok_or(ReportError::MissingWeights)?;
        Ok(AllocationReport::new(
            self.title.unwrap_or_default(),
            &weights,
            self.performance,
        ))
    }
}

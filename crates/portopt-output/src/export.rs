//! CSV and JSON export of allocations and performance statistics.

use portopt_risk::{PerformanceStats, Weights};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Infer the format from a file extension; JSON files are pretty-printed.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "unsupported export extension {:?}",
                other.unwrap_or("")
            ))),
        }
    }
}

/// One allocation row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct WeightRecord {
    pub(crate) ticker: String,
    pub(crate) weight: f64,
}

/// One performance figure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct MetricRecord {
    pub(crate) metric: String,
    pub(crate) value: f64,
}

pub(crate) fn weight_records(weights: &Weights) -> Vec<WeightRecord> {
    weights
        .iter()
        .map(|(ticker, weight)| WeightRecord {
            ticker: ticker.to_string(),
            weight,
        })
        .collect()
}

pub(crate) fn metric_records(stats: &PerformanceStats) -> Vec<MetricRecord> {
    let mut records = vec![
        MetricRecord {
            metric: "expected_return".to_string(),
            value: stats.expected_return,
        },
        MetricRecord {
            metric: "volatility".to_string(),
            value: stats.volatility,
        },
        MetricRecord {
            metric: "sharpe".to_string(),
            value: stats.sharpe,
        },
    ];
    if let Some(risk) = &stats.risk {
        records.push(MetricRecord {
            metric: risk.measure.key().to_string(),
            value: risk.value,
        });
        records.push(MetricRecord {
            metric: format!("return_{}_ratio", risk.measure.key()),
            value: risk.ratio,
        });
    }
    records
}

pub(crate) fn to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for Weights {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        let records = weight_records(self);
        match format {
            ExportFormat::Csv => to_csv(&records),
            ExportFormat::Json => Ok(serde_json::to_string(&records)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&records)?),
        }
    }
}

impl Exporter for PerformanceStats {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(&metric_records(self)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portopt_risk::{MeasuredRisk, RiskMeasure};

    fn weights() -> Weights {
        Weights::from_parts(
            &["AAPL".to_string(), "MSFT".to_string()],
            &[0.6, 0.4],
        )
    }

    fn stats() -> PerformanceStats {
        PerformanceStats {
            time_factor: 252.0,
            expected_return: 0.12,
            volatility: 0.2,
            sharpe: 0.6,
            risk: Some(MeasuredRisk {
                measure: RiskMeasure::Cvar,
                value: 0.3,
                ratio: 0.4,
            }),
        }
    }

    #[test]
    fn test_weights_csv() {
        let csv = weights().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "ticker,weight");
        assert_eq!(lines[1], "AAPL,0.6");
        assert_eq!(lines[2], "MSFT,0.4");
    }

    #[test]
    fn test_weights_json() {
        let json = weights().export_to_string(ExportFormat::Json).unwrap();
        assert_eq!(
            json,
            r#"[{"ticker":"AAPL","weight":0.6},{"ticker":"MSFT","weight":0.4}]"#
        );

        let pretty = weights().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  "));
    }

    #[test]
    fn test_performance_csv() {
        let csv = stats().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("sharpe,0.6"));
        assert!(csv.contains("cvar,0.3"));
        assert!(csv.contains("return_cvar_ratio,0.4"));
    }

    #[test]
    fn test_export_to_file() {
        let path = std::env::temp_dir().join(format!("portopt-weights-{}.csv", std::process::id()));
        weights().export_to_file(&path, ExportFormat::Csv).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("AAPL"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("w.csv")).unwrap(), ExportFormat::Csv);
        assert_eq!(
            ExportFormat::from_path(Path::new("w.JSON")).unwrap(),
            ExportFormat::PrettyJson
        );
        assert!(ExportFormat::from_path(Path::new("w.xlsx")).is_err());
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }
}

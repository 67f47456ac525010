//! Error types for the view layer.

use portopt_data::DataError;
use portopt_output::{ChartError, ExportError};
use portopt_risk::RiskError;
use thiserror::Error;

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;

/// Errors raised by the views. An optimizer without a solution is not an error.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Return series could not be retrieved or processed
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Risk or performance computation failed
    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    /// Chart could not be built or emitted
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    /// Export failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Console output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown option name
    #[error("Unknown {kind} '{value}', expected one of: {choices}")]
    UnknownOption {
        /// Option family
        kind: &'static str,
        /// Rejected input
        value: String,
        /// Accepted keys
        choices: String,
    },

    /// Option combination the view cannot serve
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

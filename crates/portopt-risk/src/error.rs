//! Error types for risk computations.

use thiserror::Error;

/// Result type for risk computations.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors that can occur while measuring risk or estimating moments.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Invalid decay parameter
    #[error("Invalid decay parameter: {0} (must be between 0 and 1)")]
    InvalidDecay(f64),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unknown option name
    #[error("Unknown {kind} '{value}', expected one of: {choices}")]
    UnknownOption {
        /// Option family (risk measure, covariance method, ...)
        kind: &'static str,
        /// Rejected input
        value: String,
        /// Accepted keys
        choices: String,
    },

    /// Estimator exists as an option but has no implementation here
    #[error("Unsupported {kind}: {value}")]
    Unsupported {
        /// Option family
        kind: &'static str,
        /// Rejected option key
        value: String,
    },
}

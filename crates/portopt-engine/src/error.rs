//! Error types for the reference optimizers.
//!
//! Errors never leave the engine: the collaborator impls turn them into
//! "no solution" and log the reason.

use portopt_data::DataError;
use portopt_risk::RiskError;
use thiserror::Error;
use tracing::{info, warn};

/// Result type for engine computations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Reasons an optimization produced no portfolio.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Estimation or risk measurement failed
    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    /// A derived return table could not be built
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Option accepted by the views that this engine does not implement
    #[error("Unsupported {kind}: {value}")]
    Unsupported {
        /// Option family
        kind: &'static str,
        /// Rejected option key
        value: String,
    },

    /// Constraints cannot be met
    #[error("Infeasible problem: {0}")]
    Infeasible(String),

    /// Vector length does not match the universe
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

impl EngineError {
    pub(crate) fn unsupported(kind: &'static str, value: impl Into<String>) -> Self {
        Self::Unsupported {
            kind,
            value: value.into(),
        }
    }
}

/// Turn an engine result into the `Option` the collaborator contracts expect.
pub(crate) fn solution<T>(result: Result<T>, problem: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e @ EngineError::Infeasible(_)) => {
            info!(problem, error = %e, "no solution");
            None
        }
        Err(e) => {
            warn!(problem, error = %e, "no solution");
            None
        }
    }
}

//! Weighting schemes that need no optimization.

use crate::ReferenceEngine;
use crate::error::{EngineError, Result, solution};
use portopt::WeightBuilder;
use portopt_risk::Weights;
use std::collections::HashMap;

/// `value / n` for every ticker.
pub fn equal_weights(tickers: &[String], value: f64) -> Weights {
    let each = value / tickers.len().max(1) as f64;
    tickers.iter().map(|t| (t.clone(), each)).collect()
}

/// Weights proportional to a positive property of every ticker.
pub fn property_weights(
    tickers: &[String],
    property: &HashMap<String, f64>,
    value: f64,
) -> Result<Weights> {
    let mut values = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        match property.get(ticker) {
            Some(&v) if v.is_finite() && v > 0.0 => values.push(v),
            Some(&v) => {
                return Err(EngineError::Infeasible(format!(
                    "{ticker} has a non-positive property value {v}"
                )));
            }
            None => {
                return Err(EngineError::Infeasible(format!(
                    "{ticker} has no property value"
                )));
            }
        }
    }
    let total: f64 = values.iter().sum();
    Ok(tickers
        .iter()
        .zip(values)
        .map(|(t, v)| (t.clone(), v / total * value))
        .collect())
}

impl WeightBuilder for ReferenceEngine {
    fn equal_weights(&self, tickers: &[String], value: f64) -> Weights {
        equal_weights(tickers, value)
    }

    fn property_weights(
        &self,
        tickers: &[String],
        property: &HashMap<String, f64>,
        value: f64,
    ) -> Option<Weights> {
        solution(property_weights(tickers, property, value), "property weighting")
    }
}

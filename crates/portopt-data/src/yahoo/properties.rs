//! Asset properties (market capitalization, volume, ...) from the Yahoo quote endpoint.

use crate::error::{DataError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Property used for property weighting when none is given.
pub const DEFAULT_PROPERTY: &str = "marketCap";

/// Yahoo Finance asset-property client.
#[derive(Debug)]
pub struct YahooPropertyClient {
    client: reqwest::Client,
    rate_limit_delay: Duration,
}

impl YahooPropertyClient {
    /// Create a property client with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a property client with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)")
                .build()?,
            rate_limit_delay,
        })
    }

    /// Fetch a numeric property for every symbol in one request.
    ///
    /// Symbols for which the endpoint reports no numeric value are absent from
    /// the returned map.
    pub async fn fetch_property(
        &self,
        symbols: &[String],
        property: &str,
    ) -> Result<HashMap<String, f64>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        if property.trim().is_empty() {
            return Err(DataError::InvalidOption("empty property name".to_string()));
        }

        let body: Value = self
            .client
            .get(QUOTE_URL)
            .query(&[("symbols", symbols.join(","))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        sleep(self.rate_limit_delay).await;

        let values = parse_property_response(&body, property)?;
        debug!(property, found = values.len(), requested = symbols.len(), "fetched property");
        Ok(values)
    }
}

/// Extract `property` for every entry of `quoteResponse.result`.
pub fn parse_property_response(body: &Value, property: &str) -> Result<HashMap<String, f64>> {
    let response = body
        .get("quoteResponse")
        .ok_or_else(|| DataError::Parse("missing quoteResponse".to_string()))?;

    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(DataError::YahooApi(error.to_string()));
    }

    let results = response
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| DataError::Parse("missing quoteResponse.result".to_string()))?;

    Ok(results
        .iter()
        .filter_map(|entry| {
            let symbol = entry.get("symbol")?.as_str()?;
            let value = entry.get(property)?.as_f64()?;
            Some((symbol.to_string(), value))
        })
        .collect())
}

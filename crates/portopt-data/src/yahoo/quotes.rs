//! Quote history fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{NaiveDate, NaiveTime};
use futures::stream::{self, StreamExt};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

/// Maximum number of concurrent quote requests in a batch.
const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a quote provider with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a quote provider with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch daily OHLCV data for a single symbol, `start` and `end` inclusive.
    ///
    /// Returns a DataFrame with columns: symbol, date, open, high, low, close,
    /// volume, adjusted_close.
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = to_offset_datetime(start, NaiveTime::MIN)?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
        let end_time = to_offset_datetime(end, end_of_day)?;

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;
        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }
        debug!(symbol, rows = quotes.len(), "fetched quote history");

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let opens: Vec<f64> = quotes.iter().map(|q| q.open).collect();
        let highs: Vec<f64> = quotes.iter().map(|q| q.high).collect();
        let lows: Vec<f64> = quotes.iter().map(|q| q.low).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let volumes: Vec<u64> = quotes.iter().map(|q| q.volume).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let mut df = DataFrame::new(vec![
            Series::new("timestamp".into(), timestamps).into(),
            Series::new("open".into(), opens).into(),
            Series::new("high".into(), highs).into(),
            Series::new("low".into(), lows).into(),
            Series::new("close".into(), closes).into(),
            Series::new("volume".into(), volumes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let symbol_col: Column = Series::new("symbol".into(), vec![symbol; df.height()]).into();
        df.with_column(symbol_col)?;

        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .select(&[
                col("symbol"),
                col("date"),
                col("open"),
                col("high"),
                col("low"),
                col("close"),
                col("volume"),
                col("adjusted_close"),
            ])
            .collect()?;

        sleep(self.rate_limit_delay).await;

        Ok(df)
    }

    /// Fetch quotes for several symbols concurrently.
    ///
    /// Symbols that fail are logged and skipped; an error is returned only
    /// when nothing could be fetched.
    pub async fn fetch_quotes_batch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        let frames: Vec<LazyFrame> = stream::iter(symbols)
            .map(|symbol| async move {
                match self.fetch_quotes(symbol, start, end).await {
                    Ok(df) => Some(df.lazy()),
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "failed to fetch quotes");
                        None
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .filter_map(|frame| async move { frame })
            .collect()
            .await;

        if frames.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbols.join(","),
                reason: "No data fetched for any symbol".to_string(),
            });
        }

        Ok(concat(frames, UnionArgs::default())?.collect()?)
    }
}

fn to_offset_datetime(date: NaiveDate, at: NaiveTime) -> Result<time::OffsetDateTime> {
    let timestamp = date.and_time(at).and_utc().timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_offset_datetime_conversion() {
        let odt = to_offset_datetime(date(2024, 1, 2), NaiveTime::MIN).unwrap();
        assert_eq!(odt.unix_timestamp(), 1_704_153_600);
    }

    #[tokio::test]
    async fn test_invalid_date_range() {
        let provider = YahooQuoteProvider::with_rate_limit(Duration::ZERO).unwrap();
        let result = provider
            .fetch_quotes("AAPL", date(2024, 2, 1), date(2024, 1, 1))
            .await;
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let provider = YahooQuoteProvider::with_rate_limit(Duration::ZERO).unwrap();
        let result = provider
            .fetch_quotes("  ", date(2024, 1, 1), date(2024, 2, 1))
            .await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_quotes() {
        let provider = YahooQuoteProvider::new().unwrap();
        let df = provider
            .fetch_quotes("AAPL", date(2024, 1, 2), date(2024, 1, 31))
            .await
            .unwrap();
        assert!(df.height() > 0);
        assert_eq!(
            df.get_column_names(),
            vec![
                "symbol",
                "date",
                "open",
                "high",
                "low",
                "close",
                "volume",
                "adjusted_close"
            ]
        );
    }
}

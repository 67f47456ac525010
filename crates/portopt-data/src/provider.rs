//! Return-series and asset-property providers.
//!
//! [`ReturnsProvider`] and [`PropertyProvider`] are the seams the view layer
//! talks to; [`YahooReturnsProvider`] implements both on top of the Yahoo
//! clients and the SQLite cache.

use crate::cache::SqliteCache;
use crate::error::{DataError, Result};
use crate::returns::{PriceTable, ReturnTable, ReturnsRequest, process_prices};
use crate::yahoo::{YahooPropertyClient, YahooQuoteProvider};
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Source of processed return tables.
pub trait ReturnsProvider {
    /// Retrieve prices for `request.tickers` over `request.window` and
    /// process them into a return table.
    fn fetch_returns(&self, request: &ReturnsRequest) -> impl Future<Output = Result<ReturnTable>>;
}

/// Source of numeric per-asset properties such as market capitalization.
pub trait PropertyProvider {
    /// Look up `property` for every ticker. Tickers without a value are
    /// absent from the map.
    fn fetch_property(
        &self,
        tickers: &[String],
        property: &str,
    ) -> impl Future<Output = Result<HashMap<String, f64>>>;
}

/// Configuration for data fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached rows, still write new ones).
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// First date requested when the window covers all available history.
const EARLIEST_DATE: (i32, u32, u32) = (1970, 1, 2);

/// Yahoo-backed provider with an optional SQLite cache.
#[derive(Debug)]
pub struct YahooReturnsProvider {
    quotes: YahooQuoteProvider,
    properties: YahooPropertyClient,
    cache: Option<Mutex<SqliteCache>>,
    config: FetchConfig,
}

impl YahooReturnsProvider {
    /// Create a provider; `cache` is consulted only when `config.use_cache` is set.
    pub fn new(
        quotes: YahooQuoteProvider,
        properties: YahooPropertyClient,
        cache: Option<SqliteCache>,
        config: FetchConfig,
    ) -> Self {
        let cache = cache.filter(|_| config.use_cache).map(Mutex::new);
        Self {
            quotes,
            properties,
            cache,
            config,
        }
    }

    /// Create a provider with default clients and no cache.
    pub fn uncached() -> Result<Self> {
        Ok(Self::new(
            YahooQuoteProvider::new()?,
            YahooPropertyClient::new()?,
            None,
            FetchConfig {
                use_cache: false,
                force_refresh: false,
            },
        ))
    }

    async fn load_quotes(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        full_history: bool,
    ) -> Result<DataFrame> {
        let mut frames = Vec::new();
        let mut to_fetch = Vec::new();

        match &self.cache {
            Some(cache) if !self.config.force_refresh && !full_history => {
                let cache = cache.lock().await;
                for ticker in tickers {
                    if cache.has_quotes(ticker, start, end).unwrap_or(false)
                        && let Ok(df) = cache.get_quotes(ticker, start, end)
                    {
                        frames.push(df.lazy());
                        continue;
                    }
                    to_fetch.push(ticker.clone());
                }
            }
            _ => to_fetch = tickers.to_vec(),
        }
        debug!(
            cached = frames.len(),
            fetching = to_fetch.len(),
            "resolved quote sources"
        );

        if !to_fetch.is_empty() {
            match self.quotes.fetch_quotes_batch(&to_fetch, start, end).await {
                Ok(df) => {
                    if let Some(cache) = &self.cache
                        && let Err(e) = cache.lock().await.put_quotes(&df)
                    {
                        warn!(error = %e, "failed to cache quotes");
                    }
                    frames.push(df.lazy());
                }
                Err(e) if !frames.is_empty() => {
                    warn!(error = %e, "no fresh quotes, continuing with cached data");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(concat(frames, UnionArgs::default())?.collect()?)
    }
}

impl ReturnsProvider for YahooReturnsProvider {
    async fn fetch_returns(&self, request: &ReturnsRequest) -> Result<ReturnTable> {
        if request.tickers.is_empty() {
            return Err(DataError::InvalidSymbol("no tickers given".to_string()));
        }

        let today = Utc::now().date_naive();
        let (start, end) = request.window.resolve(today)?;
        let full_history = start.is_none();
        let (y, m, d) = EARLIEST_DATE;
        let start = start
            .or_else(|| NaiveDate::from_ymd_opt(y, m, d))
            .ok_or_else(|| DataError::TimeConversion("invalid earliest date".to_string()))?;

        info!(tickers = request.tickers.len(), %start, %end, "loading prices");
        let quotes = self
            .load_quotes(&request.tickers, start, end, full_history)
            .await?;

        let prices = PriceTable::from_quotes(&quotes, &request.tickers)?;
        process_prices(&prices, &request.options)
    }
}

impl PropertyProvider for YahooReturnsProvider {
    async fn fetch_property(
        &self,
        tickers: &[String],
        property: &str,
    ) -> Result<HashMap<String, f64>> {
        let today = Utc::now().date_naive();
        let mut values = HashMap::new();
        let mut missing = Vec::new();

        match &self.cache {
            Some(cache) if !self.config.force_refresh => {
                let cache = cache.lock().await;
                for ticker in tickers {
                    match cache.get_property(ticker, property, today)? {
                        Some(v) => {
                            values.insert(ticker.clone(), v);
                        }
                        None => missing.push(ticker.clone()),
                    }
                }
            }
            _ => missing = tickers.to_vec(),
        }

        if !missing.is_empty() {
            let fetched = self.properties.fetch_property(&missing, property).await?;
            if let Some(cache) = &self.cache {
                let cache = cache.lock().await;
                for (ticker, value) in &fetched {
                    if let Err(e) = cache.put_property(ticker, property, today, *value) {
                        warn!(ticker = %ticker, error = %e, "failed to cache property");
                    }
                }
            }
            values.extend(fetched);
        }

        for ticker in tickers.iter().filter(|t| !values.contains_key(*t)) {
            warn!(ticker = %ticker, property, "property not available");
        }
        Ok(values)
    }
}

//! SQLite caching layer for quote history and asset properties.

use crate::error::{DataError, Result};
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// Default cache location: `<user cache dir>/portopt/portopt.db`.
pub fn default_cache_path(cache_root: Option<PathBuf>) -> PathBuf {
    cache_root
        .unwrap_or_else(|| PathBuf::from("."))
        .join("portopt")
        .join("portopt.db")
}

/// SQLite cache for market data.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open (or create) the cache at `path`, creating parent directories.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                adjusted_close REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quotes_symbol_date ON quotes(symbol, date)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS properties (
                symbol TEXT NOT NULL,
                property TEXT NOT NULL,
                date TEXT NOT NULL,
                value REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, property, date)
            )",
            [],
        )?;

        Ok(())
    }

    /// Check if quotes are cached for a symbol and date range.
    pub fn has_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3",
            params![symbol, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        // ~252 trading days over 365 calendar days; demand 70% of that ratio
        let days = (end - start).num_days();
        let expected_count = (days as f64 * 252.0 / 365.0 * 0.7) as i64;

        Ok(count > 0 && count >= expected_count)
    }

    /// Earliest cached quote date for a symbol.
    pub fn first_quote_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        let first: Option<String> = self.conn.query_row(
            "SELECT MIN(date) FROM quotes WHERE symbol = ?1",
            params![symbol],
            |row| row.get(0),
        )?;
        first
            .map(|d| {
                NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|e| DataError::Parse(format!("bad cached date '{d}': {e}")))
            })
            .transpose()
    }

    /// Get cached quotes for a symbol and date range.
    pub fn get_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, date, open, high, low, close, volume, adjusted_close
             FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let mut symbols = Vec::new();
        let mut dates = Vec::new();
        let mut opens = Vec::new();
        let mut highs = Vec::new();
        let mut lows = Vec::new();
        let mut closes = Vec::new();
        let mut volumes = Vec::new();
        let mut adj_closes = Vec::new();

        let rows = stmt.query_map(params![symbol, start.to_string(), end.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, f64>(7)?,
            ))
        })?;

        for row in rows {
            let (sym, date, open, high, low, close, volume, adj_close) = row?;
            symbols.push(sym);
            dates.push(date);
            opens.push(open);
            highs.push(high);
            lows.push(low);
            closes.push(close);
            volumes.push(volume as u64);
            adj_closes.push(adj_close);
        }

        if dates.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No cached data found".to_string(),
            });
        }

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            Series::new("date".into(), dates).into(),
            Series::new("open".into(), opens).into(),
            Series::new("high".into(), highs).into(),
            Series::new("low".into(), lows).into(),
            Series::new("close".into(), closes).into(),
            Series::new("volume".into(), volumes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let df = df
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()?;

        Ok(df)
    }

    /// Store quotes in the cache, replacing existing rows for the same day.
    pub fn put_quotes(&self, df: &DataFrame) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let symbols = df.column("symbol")?.str()?;
        let dates = df.column("date")?.cast(&DataType::String)?;
        let dates = dates.str()?;
        let opens = df.column("open")?.f64()?;
        let highs = df.column("high")?.f64()?;
        let lows = df.column("low")?.f64()?;
        let closes = df.column("close")?.f64()?;
        let volumes = df.column("volume")?.cast(&DataType::Int64)?;
        let volumes = volumes.i64()?;
        let adj_closes = df.column("adjusted_close")?.f64()?;

        let missing = |field: &str| DataError::Parse(format!("Missing {field}"));
        let tx = self.conn.unchecked_transaction()?;

        for i in 0..df.height() {
            let symbol = symbols.get(i).ok_or_else(|| missing("symbol"))?;
            let date = dates.get(i).ok_or_else(|| missing("date"))?;
            let open = opens.get(i).ok_or_else(|| missing("open"))?;
            let high = highs.get(i).ok_or_else(|| missing("high"))?;
            let low = lows.get(i).ok_or_else(|| missing("low"))?;
            let close = closes.get(i).ok_or_else(|| missing("close"))?;
            let volume = volumes.get(i).ok_or_else(|| missing("volume"))?;
            let adj_close = adj_closes.get(i).ok_or_else(|| missing("adjusted_close"))?;

            tx.execute(
                "INSERT OR REPLACE INTO quotes
                 (symbol, date, open, high, low, close, volume, adjusted_close, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    symbol, date, open, high, low, close, volume, adj_close, cached_at
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Store an asset property observed on `date`.
    pub fn put_property(
        &self,
        symbol: &str,
        property: &str,
        date: NaiveDate,
        value: f64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO properties (symbol, property, date, value, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                symbol,
                property,
                date.to_string(),
                value,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Get an asset property observed on `date`.
    pub fn get_property(&self, symbol: &str, property: &str, date: NaiveDate) -> Result<Option<f64>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM properties WHERE symbol = ?1 AND property = ?2 AND date = ?3",
                params![symbol, property, date.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM quotes", [])?;
        self.conn.execute("DELETE FROM properties", [])?;
        Ok(())
    }

    /// Clear cached data for a specific symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM quotes WHERE symbol = ?1", params![symbol])?;
        self.conn
            .execute("DELETE FROM properties WHERE symbol = ?1", params![symbol])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let quotes_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;

        let symbols_count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT symbol) FROM quotes", [], |row| {
                    row.get(0)
                })?;

        let properties_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;

        Ok(CacheStats {
            total_quotes: quotes_count as usize,
            unique_symbols: symbols_count as usize,
            properties: properties_count as usize,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of quote records
    pub total_quotes: usize,
    /// Number of unique symbols with quotes
    pub unique_symbols: usize,
    /// Number of cached property observations
    pub properties: usize,
}

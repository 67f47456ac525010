//! Price alignment and return-series preparation.
//!
//! Quotes arrive per symbol with their own calendars. They are aligned on the
//! union of trading dates ([`PriceTable`]), resampled to the requested
//! [`Frequency`], turned into periodic returns and cleaned according to
//! [`ReturnsOptions`] to produce a rectangular [`ReturnTable`].

use crate::error::{DataError, Result};
use crate::period::DateWindow;
use chrono::{Datelike, NaiveDate};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Sampling frequency of the return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Frequency {
    /// Daily returns (252 periods per year)
    #[default]
    Daily,
    /// Weekly returns (52 periods per year)
    Weekly,
    /// Monthly returns (12 periods per year)
    Monthly,
}

impl Frequency {
    /// Number of periods per year.
    pub const fn time_factor(&self) -> f64 {
        match self {
            Self::Daily => 252.0,
            Self::Weekly => 52.0,
            Self::Monthly => 12.0,
        }
    }

    /// Single-letter key (`D`, `W`, `M`).
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Daily => "D",
            Self::Weekly => "W",
            Self::Monthly => "M",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Frequency {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(Self::Daily),
            "W" => Ok(Self::Weekly),
            "M" => Ok(Self::Monthly),
            _ => Err(DataError::InvalidOption(format!(
                "unknown frequency '{s}', expected one of D, W, M"
            ))),
        }
    }
}

/// How remaining gaps in the return series are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMethod {
    /// Linear interpolation weighted by calendar distance
    #[default]
    Time,
    /// Linear interpolation over row positions
    Linear,
    /// Propagate the last valid value forward
    Pad,
    /// Propagate the next valid value backward
    Backfill,
    /// Use the closest valid value
    Nearest,
}

impl FillMethod {
    /// Canonical option key.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Linear => "linear",
            Self::Pad => "ffill",
            Self::Backfill => "bfill",
            Self::Nearest => "nearest",
        }
    }
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FillMethod {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "linear" => Ok(Self::Linear),
            "ffill" | "pad" => Ok(Self::Pad),
            "bfill" | "backfill" => Ok(Self::Backfill),
            "nearest" => Ok(Self::Nearest),
            _ => Err(DataError::InvalidOption(format!(
                "unknown fill method '{s}', expected one of time, linear, ffill, bfill, nearest"
            ))),
        }
    }
}

/// Return-processing policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnsOptions {
    /// Use log returns instead of arithmetic returns
    pub log_returns: bool,
    /// Resampling frequency
    pub freq: Frequency,
    /// Maximum fraction of missing returns an asset may have
    pub max_nan: f64,
    /// Absolute return above which a value is treated as an outlier (0 disables)
    pub threshold: f64,
    /// Gap filling method
    pub fill: FillMethod,
}

impl Default for ReturnsOptions {
    fn default() -> Self {
        Self {
            log_returns: false,
            freq: Frequency::Daily,
            max_nan: 0.05,
            threshold: 0.0,
            fill: FillMethod::Time,
        }
    }
}

/// Everything a returns provider needs to build a [`ReturnTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsRequest {
    /// Asset tickers, in display order
    pub tickers: Vec<String>,
    /// History window
    pub window: DateWindow,
    /// Processing policy
    pub options: ReturnsOptions,
}

impl ReturnsRequest {
    /// Create a request over `tickers` with default window and options.
    pub fn new(tickers: Vec<String>) -> Self {
        Self {
            tickers,
            window: DateWindow::default(),
            options: ReturnsOptions::default(),
        }
    }

    /// Set the history window.
    pub const fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    /// Set the processing options.
    pub const fn with_options(mut self, options: ReturnsOptions) -> Self {
        self.options = options;
        self
    }
}

/// Prices aligned on the union of trading dates. Missing prices are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Array2<f64>,
}

impl PriceTable {
    /// Create a price table; `prices` has one row per date and one column per ticker.
    pub fn new(tickers: Vec<String>, dates: Vec<NaiveDate>, prices: Array2<f64>) -> Result<Self> {
        check_shape(&tickers, &dates, &prices)?;
        Ok(Self {
            tickers,
            dates,
            prices,
        })
    }

    /// Build a price table from a quote frame with `symbol`, `date` and
    /// `adjusted_close` columns. Columns follow the order of `tickers`.
    pub fn from_quotes(quotes: &DataFrame, tickers: &[String]) -> Result<Self> {
        let symbols = quotes.column("symbol")?.str()?.clone();
        let dates = quotes.column("date")?.cast(&DataType::String)?;
        let dates = dates.str()?;
        let closes = quotes.column("adjusted_close")?.f64()?;

        let position: HashMap<&str, usize> = tickers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut rows: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for i in 0..quotes.height() {
            let (Some(symbol), Some(date), Some(close)) = (symbols.get(i), dates.get(i), closes.get(i))
            else {
                continue;
            };
            let Some(&col) = position.get(symbol) else {
                continue;
            };
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("bad quote date '{date}': {e}")))?;
            rows.entry(date).or_insert_with(|| vec![f64::NAN; tickers.len()])[col] = close;
        }

        let dates: Vec<NaiveDate> = rows.keys().copied().collect();
        let mut prices = Array2::from_elem((dates.len(), tickers.len()), f64::NAN);
        for (r, values) in rows.values().enumerate() {
            for (c, v) in values.iter().enumerate() {
                prices[[r, c]] = *v;
            }
        }

        Self::new(tickers.to_vec(), dates, prices)
    }

    /// Asset tickers.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Row dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Price matrix (dates x assets).
    pub const fn prices(&self) -> &Array2<f64> {
        &self.prices
    }

    /// Keep the last valid price of every week (`Weekly`) or month (`Monthly`).
    pub fn resample(&self, freq: Frequency) -> Self {
        let bucket = |d: &NaiveDate| -> (i32, u32) {
            match freq {
                Frequency::Daily => (d.num_days_from_ce(), 0),
                Frequency::Weekly => {
                    let iso = d.iso_week();
                    (iso.year(), iso.week())
                }
                Frequency::Monthly => (d.year(), d.month()),
            }
        };
        if freq == Frequency::Daily {
            return self.clone();
        }

        let n_assets = self.tickers.len();
        let mut dates = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut current = None;
        for (r, date) in self.dates.iter().enumerate() {
            let key = bucket(date);
            if current != Some(key) {
                current = Some(key);
                dates.push(*date);
                rows.push(vec![f64::NAN; n_assets]);
            }
            let last = rows.len() - 1;
            dates[last] = *date;
            for c in 0..n_assets {
                let price = self.prices[[r, c]];
                if !price.is_nan() {
                    rows[last][c] = price;
                }
            }
        }

        let mut prices = Array2::from_elem((dates.len(), n_assets), f64::NAN);
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                prices[[r, c]] = *v;
            }
        }
        Self {
            tickers: self.tickers.clone(),
            dates,
            prices,
        }
    }
}

/// Rectangular table of periodic returns (periods x assets), free of NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
}

impl ReturnTable {
    /// Create a return table; `values` has one row per date and one column per ticker.
    pub fn new(tickers: Vec<String>, dates: Vec<NaiveDate>, values: Array2<f64>) -> Result<Self> {
        check_shape(&tickers, &dates, &values)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DataError::Parse(
                "return table contains non-finite values".to_string(),
            ));
        }
        Ok(Self {
            tickers,
            dates,
            values,
        })
    }

    /// Asset tickers, in column order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Period end dates, in row order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return matrix (periods x assets).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of periods.
    pub fn n_periods(&self) -> usize {
        self.values.nrows()
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.values.ncols()
    }

    /// Column index of `ticker`.
    pub fn position(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Arithmetic mean return of every asset.
    pub fn mean(&self) -> Array1<f64> {
        self.values
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.n_assets()))
    }

    /// Sample covariance matrix (denominator `T - 1`).
    pub fn covariance(&self) -> Array2<f64> {
        let n = self.n_periods();
        if n < 2 {
            return Array2::zeros((self.n_assets(), self.n_assets()));
        }
        let centered = &self.values - &self.mean().insert_axis(Axis(0));
        centered.t().dot(&centered) / (n as f64 - 1.0)
    }

    /// Portfolio return series `R w`. `weights` follows column order.
    pub fn portfolio_returns(&self, weights: &[f64]) -> Array1<f64> {
        self.values.dot(&Array1::from(weights.to_vec()))
    }

    /// Sub-table with the given columns, in the given order.
    pub fn select(&self, columns: &[usize]) -> Self {
        Self {
            tickers: columns.iter().map(|&c| self.tickers[c].clone()).collect(),
            dates: self.dates.clone(),
            values: self.values.select(Axis(1), columns),
        }
    }
}

fn check_shape(tickers: &[String], dates: &[NaiveDate], values: &Array2<f64>) -> Result<()> {
    if values.dim() != (dates.len(), tickers.len()) {
        return Err(DataError::Parse(format!(
            "table shape {:?} does not match {} dates x {} tickers",
            values.dim(),
            dates.len(),
            tickers.len()
        )));
    }
    Ok(())
}

/// Turn aligned prices into a clean return table.
///
/// Steps, in order: resample, compute arithmetic or log returns, drop assets
/// whose missing fraction exceeds `max_nan`, blank out returns larger than
/// `threshold` in absolute value, fill gaps and drop rows that are still
/// incomplete.
pub fn process_prices(prices: &PriceTable, options: &ReturnsOptions) -> Result<ReturnTable> {
    if !(0.0..=1.0).contains(&options.max_nan) {
        return Err(DataError::InvalidOption(format!(
            "max_nan must be within [0, 1], got {}",
            options.max_nan
        )));
    }

    let sampled = prices.resample(options.freq);
    let (n_rows, n_assets) = sampled.prices.dim();
    if n_rows < 2 {
        return Err(DataError::MissingData {
            symbol: sampled.tickers.join(","),
            reason: "fewer than two price observations".to_string(),
        });
    }

    let mut returns = Array2::from_elem((n_rows - 1, n_assets), f64::NAN);
    for r in 1..n_rows {
        for c in 0..n_assets {
            let prev = sampled.prices[[r - 1, c]];
            let curr = sampled.prices[[r, c]];
            if prev.is_finite() && curr.is_finite() && prev > 0.0 {
                returns[[r - 1, c]] = if options.log_returns {
                    (curr / prev).ln()
                } else {
                    curr / prev - 1.0
                };
            }
        }
    }
    let dates: Vec<NaiveDate> = sampled.dates[1..].to_vec();

    let periods = returns.nrows() as f64;
    let keep: Vec<usize> = (0..n_assets)
        .filter(|&c| {
            let missing = returns.column(c).iter().filter(|v| v.is_nan()).count() as f64;
            let fraction = missing / periods;
            if fraction > options.max_nan {
                warn!(
                    ticker = %sampled.tickers[c],
                    missing = fraction,
                    "dropping asset above the NaN limit"
                );
                false
            } else {
                true
            }
        })
        .collect();
    if keep.is_empty() {
        return Err(DataError::EmptyUniverse {
            max_nan: options.max_nan,
        });
    }
    let mut returns = returns.select(Axis(1), &keep);
    let tickers: Vec<String> = keep.iter().map(|&c| sampled.tickers[c].clone()).collect();

    if options.threshold > 0.0 {
        returns.mapv_inplace(|v| {
            if v.abs() > options.threshold {
                f64::NAN
            } else {
                v
            }
        });
    }

    for mut column in returns.columns_mut() {
        let mut values = column.to_vec();
        fill_gaps(&mut values, &dates, options.fill);
        for (slot, v) in column.iter_mut().zip(values) {
            *slot = v;
        }
    }

    let complete: Vec<usize> = (0..returns.nrows())
        .filter(|&r| returns.row(r).iter().all(|v| v.is_finite()))
        .collect();
    let values = returns.select(Axis(0), &complete);
    let dates: Vec<NaiveDate> = complete.iter().map(|&r| dates[r]).collect();
    debug!(
        periods = values.nrows(),
        assets = values.ncols(),
        "prepared return table"
    );

    ReturnTable::new(tickers, dates, values)
}

/// Fill NaN values of one series in place. Leading or trailing gaps that the
/// method cannot reach are left as NaN.
fn fill_gaps(values: &mut [f64], dates: &[NaiveDate], method: FillMethod) {
    let valid: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();
    if valid.is_empty() || valid.len() == values.len() {
        return;
    }

    for i in 0..values.len() {
        if values[i].is_finite() {
            continue;
        }
        let next = valid.partition_point(|&v| v < i);
        let before = next.checked_sub(1).map(|k| valid[k]);
        let after = valid.get(next).copied();

        values[i] = match (method, before, after) {
            (FillMethod::Pad, Some(b), _) => values[b],
            (FillMethod::Backfill, _, Some(a)) => values[a],
            (FillMethod::Nearest, Some(b), Some(a)) => {
                if i - b <= a - i {
                    values[b]
                } else {
                    values[a]
                }
            }
            (FillMethod::Nearest, Some(b), None) => values[b],
            (FillMethod::Nearest, None, Some(a)) => values[a],
            (FillMethod::Linear, Some(b), Some(a)) => {
                let t = (i - b) as f64 / (a - b) as f64;
                values[b] + t * (values[a] - values[b])
            }
            (FillMethod::Time, Some(b), Some(a)) => {
                let span = (dates[a] - dates[b]).num_days() as f64;
                let t = if span > 0.0 {
                    (dates[i] - dates[b]).num_days() as f64 / span
                } else {
                    0.0
                };
                values[b] + t * (values[a] - values[b])
            }
            _ => f64::NAN,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn business_days(n: usize) -> Vec<NaiveDate> {
        // 2024-01-01 is a Monday
        let mut out = Vec::with_capacity(n);
        let mut d = date(2024, 1, 1);
        while out.len() < n {
            if d.weekday().num_days_from_monday() < 5 {
                out.push(d);
            }
            d = d.succ_opt().unwrap();
        }
        out
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("d", Frequency::Daily, 252.0)]
    #[case("W", Frequency::Weekly, 52.0)]
    #[case("m", Frequency::Monthly, 12.0)]
    fn test_frequency(#[case] key: &str, #[case] expected: Frequency, #[case] factor: f64) {
        let freq: Frequency = key.parse().unwrap();
        assert_eq!(freq, expected);
        assert_eq!(freq.time_factor(), factor);
    }

    #[test]
    fn test_arithmetic_and_log_returns() {
        let prices = PriceTable::new(
            tickers(&["A"]),
            business_days(3),
            array![[100.0], [110.0], [99.0]],
        )
        .unwrap();

        let simple = process_prices(&prices, &ReturnsOptions::default()).unwrap();
        assert_eq!(simple.n_periods(), 2);
        assert_relative_eq!(simple.values()[[0, 0]], 0.1, epsilon = 1e-12);
        assert_relative_eq!(simple.values()[[1, 0]], -0.1, epsilon = 1e-12);

        let options = ReturnsOptions {
            log_returns: true,
            ..ReturnsOptions::default()
        };
        let log = process_prices(&prices, &options).unwrap();
        assert_relative_eq!(log.values()[[0, 0]], 1.1_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_weekly_resampling_keeps_last_price() {
        let days = business_days(10);
        let prices: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let table = PriceTable::new(
            tickers(&["A"]),
            days.clone(),
            Array2::from_shape_vec((10, 1), prices).unwrap(),
        )
        .unwrap();

        let weekly = table.resample(Frequency::Weekly);
        assert_eq!(weekly.dates(), &[days[4], days[9]]);
        assert_eq!(weekly.prices()[[0, 0]], 104.0);
        assert_eq!(weekly.prices()[[1, 0]], 109.0);
    }

    #[test]
    fn test_assets_above_nan_limit_are_dropped() {
        let days = business_days(5);
        let prices = array![
            [100.0, 50.0],
            [101.0, f64::NAN],
            [102.0, f64::NAN],
            [103.0, 51.0],
            [104.0, 52.0],
        ];
        let table = PriceTable::new(tickers(&["A", "B"]), days, prices).unwrap();

        let returns = process_prices(&table, &ReturnsOptions::default()).unwrap();
        assert_eq!(returns.tickers(), &["A".to_string()]);
        assert_eq!(returns.n_periods(), 4);

        let options = ReturnsOptions {
            max_nan: 0.8,
            fill: FillMethod::Linear,
            ..ReturnsOptions::default()
        };
        let returns = process_prices(&table, &options).unwrap();
        assert_eq!(returns.n_assets(), 2);
    }

    #[test]
    fn test_nan_limit_can_empty_the_universe() {
        let prices = array![[100.0], [f64::NAN], [f64::NAN], [101.0]];
        let table = PriceTable::new(tickers(&["A"]), business_days(4), prices).unwrap();
        assert!(matches!(
            process_prices(&table, &ReturnsOptions::default()),
            Err(DataError::EmptyUniverse { .. })
        ));
    }

    #[test]
    fn test_threshold_replaces_outliers() {
        let prices = array![[100.0], [101.0], [202.0], [204.0], [206.0]];
        let table = PriceTable::new(tickers(&["A"]), business_days(5), prices).unwrap();
        let options = ReturnsOptions {
            threshold: 0.5,
            max_nan: 1.0,
            fill: FillMethod::Linear,
            ..ReturnsOptions::default()
        };

        let returns = process_prices(&table, &options).unwrap();
        let r = returns.values().column(0).to_vec();
        // the +100% jump is blanked and interpolated from its neighbours
        assert_relative_eq!(r[1], (r[0] + r[2]) / 2.0, epsilon = 1e-12);
        assert!(r.iter().all(|v| v.abs() <= 0.5));
    }

    #[rstest]
    #[case(FillMethod::Pad, 1.0)]
    #[case(FillMethod::Backfill, 4.0)]
    #[case(FillMethod::Linear, 2.0)]
    #[case(FillMethod::Nearest, 1.0)]
    fn test_fill_methods(#[case] method: FillMethod, #[case] expected: f64) {
        let dates = business_days(5);
        let mut values = vec![0.0, 1.0, f64::NAN, f64::NAN, 4.0];
        fill_gaps(&mut values, &dates, method);
        assert_relative_eq!(values[2], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_time_fill_uses_calendar_distance() {
        // Friday, Monday, Tuesday: the gap on Monday is 3/4 of the way
        let dates = vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 9)];
        let mut values = vec![0.0, f64::NAN, 4.0];
        fill_gaps(&mut values, &dates, FillMethod::Time);
        assert_relative_eq!(values[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_quotes_aligns_calendars() {
        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec!["B", "A", "A", "B"]).into(),
            Series::new(
                "date".into(),
                vec!["2024-01-02", "2024-01-02", "2024-01-03", "2024-01-04"],
            )
            .into(),
            Series::new("adjusted_close".into(), vec![10.0, 20.0, 21.0, 11.0]).into(),
        ])
        .unwrap();

        let table = PriceTable::from_quotes(&df, &tickers(&["A", "B"])).unwrap();
        assert_eq!(table.dates().len(), 3);
        assert_eq!(table.prices()[[0, 0]], 20.0);
        assert_eq!(table.prices()[[0, 1]], 10.0);
        assert!(table.prices()[[1, 1]].is_nan());
        assert!(table.prices()[[2, 0]].is_nan());
    }

    #[test]
    fn test_return_table_statistics() {
        let table = ReturnTable::new(
            tickers(&["A", "B"]),
            business_days(4),
            array![[0.01, 0.02], [0.03, -0.01], [-0.02, 0.00], [0.02, 0.03]],
        )
        .unwrap();

        let mean = table.mean();
        assert_relative_eq!(mean[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(mean[1], 0.01, epsilon = 1e-12);

        let cov = table.covariance();
        assert_relative_eq!(cov[[0, 1]], cov[[1, 0]], epsilon = 1e-15);
        // var(A) = (0 + 4 + 9 + 1) e-4 / 3
        assert_relative_eq!(cov[[0, 0]], 14.0e-4 / 3.0, epsilon = 1e-12);

        let port = table.portfolio_returns(&[0.5, 0.5]);
        assert_relative_eq!(port[0], 0.015, epsilon = 1e-12);

        let b = table.select(&[1]);
        assert_eq!(b.tickers(), &["B".to_string()]);
        assert_eq!(b.values()[[1, 0]], -0.01);
    }

    #[test]
    fn test_return_table_rejects_nan() {
        let result = ReturnTable::new(tickers(&["A"]), business_days(1), array![[f64::NAN]]);
        assert!(result.is_err());
    }
}

//! Ordered ticker to amount mapping.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

/// Portfolio allocation, in insertion order.
///
/// Amounts are fractions of capital when they sum to about one, otherwise
/// currency amounts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, From, Into)]
pub struct Weights(Vec<(String, f64)>);

impl Weights {
    /// An empty allocation.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Pair `tickers` with `values` positionally.
    pub fn from_parts(tickers: &[String], values: &[f64]) -> Self {
        Self(
            tickers
                .iter()
                .cloned()
                .zip(values.iter().copied())
                .collect(),
        )
    }

    /// Set the amount of `ticker`, keeping its position when already present.
    pub fn insert(&mut self, ticker: impl Into<String>, value: f64) {
        let ticker = ticker.into();
        match self.0.iter_mut().find(|(t, _)| *t == ticker) {
            Some(entry) => entry.1 = value,
            None => self.0.push((ticker, value)),
        }
    }

    /// Amount allocated to `ticker`.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.0.iter().find(|(t, _)| t == ticker).map(|(_, v)| *v)
    }

    /// Iterate over `(ticker, amount)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(t, v)| (t.as_str(), *v))
    }

    /// Tickers in order.
    pub fn tickers(&self) -> Vec<String> {
        self.0.iter().map(|(t, _)| t.clone()).collect()
    }

    /// Amounts in order.
    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|(_, v)| *v).collect()
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the allocation is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of amounts.
    pub fn sum(&self) -> f64 {
        self.0.iter().map(|(_, v)| v).sum()
    }

    /// Mean absolute amount.
    pub fn mean_abs(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        self.0.iter().map(|(_, v)| v.abs()).sum::<f64>() / self.0.len() as f64
    }

    /// Whether the amounts are fractions of capital (sum within 10% of one).
    pub fn is_normalized(&self) -> bool {
        is_close(self.sum(), 1.0, 0.1)
    }

    /// Amounts ordered like `tickers`; unknown tickers get zero.
    pub fn aligned(&self, tickers: &[String]) -> Vec<f64> {
        tickers
            .iter()
            .map(|t| self.get(t).unwrap_or(0.0))
            .collect()
    }

    /// Multiply every amount by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|(t, v)| (t.clone(), v * factor)).collect())
    }

    /// Amounts divided by their sum; unchanged when the sum is zero.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if total == 0.0 {
            return self.clone();
        }
        self.scaled(1.0 / total)
    }
}

impl FromIterator<(String, f64)> for Weights {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut weights = Self::new();
        for (ticker, value) in iter {
            weights.insert(ticker, value);
        }
        weights
    }
}

/// Relative closeness: `|a - b| <= rel_tol * max(|a|, |b|)`.
pub fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insertion_order_and_replace() {
        let mut w = Weights::new();
        w.insert("MSFT", 0.2);
        w.insert("AAPL", 0.5);
        w.insert("MSFT", 0.5);
        assert_eq!(w.tickers(), tickers(&["MSFT", "AAPL"]));
        assert_eq!(w.values(), vec![0.5, 0.5]);
        assert_eq!(w.get("GOOG"), None);
    }

    #[rstest]
    #[case(&[0.25, 0.25, 0.25, 0.25], true)]
    #[case(&[0.5, 0.45], true)]
    #[case(&[0.5, 0.6], true)]
    #[case(&[0.5, 0.3], false)]
    #[case(&[500.0, 500.0], false)]
    fn test_is_normalized(#[case] values: &[f64], #[case] expected: bool) {
        let names: Vec<String> = (0..values.len()).map(|i| format!("T{i}")).collect();
        assert_eq!(Weights::from_parts(&names, values).is_normalized(), expected);
    }

    #[test]
    fn test_aligned_and_scaled() {
        let w = Weights::from_parts(&tickers(&["A", "B"]), &[0.4, 0.6]);
        assert_eq!(w.aligned(&tickers(&["B", "C", "A"])), vec![0.6, 0.0, 0.4]);
        assert_eq!(w.scaled(1000.0).values(), vec![400.0, 600.0]);
        assert_eq!(w.scaled(2.0).normalized().values(), vec![0.4, 0.6]);
        assert_eq!(w.mean_abs(), 0.5);
    }

    #[test]
    fn test_from_iterator() {
        let w: Weights = vec![("A".to_string(), 1.0), ("B".to_string(), -1.0)]
            .into_iter()
            .collect();
        assert_eq!(w.len(), 2);
        assert_eq!(w.sum(), 0.0);
    }
}

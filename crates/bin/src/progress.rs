//! Progress indication while market data is fetched.

use indicatif::{ProgressBar, ProgressStyle};
use portopt_data::{PropertyProvider, Result, ReturnTable, ReturnsProvider, ReturnsRequest};
use std::collections::HashMap;
use std::time::Duration;

/// Shows a spinner on stderr while the wrapped provider fetches.
#[derive(Debug)]
pub(crate) struct Spinning<P> {
    inner: P,
}

impl<P> Spinning<P> {
    pub(crate) const fn new(inner: P) -> Self {
        Self { inner }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

impl<P: ReturnsProvider> ReturnsProvider for Spinning<P> {
    async fn fetch_returns(&self, request: &ReturnsRequest) -> Result<ReturnTable> {
        let pb = spinner(format!(
            "Fetching prices for {} tickers...",
            request.tickers.len()
        ));
        let result = self.inner.fetch_returns(request).await;
        pb.finish_and_clear();
        result
    }
}

impl<P: PropertyProvider> PropertyProvider for Spinning<P> {
    async fn fetch_property(
        &self,
        tickers: &[String],
        property: &str,
    ) -> Result<HashMap<String, f64>> {
        let pb = spinner(format!("Fetching {property}..."));
        let result = self.inner.fetch_property(tickers, property).await;
        pb.finish_and_clear();
        result
    }
}

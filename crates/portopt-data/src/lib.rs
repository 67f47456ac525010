#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/portopt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod period;
pub mod provider;
pub mod returns;
pub mod yahoo;

pub use cache::{CacheStats, SqliteCache, default_cache_path};
pub use error::{DataError, Result};
pub use period::{DateWindow, Period, period_label};
pub use provider::{FetchConfig, PropertyProvider, ReturnsProvider, YahooReturnsProvider};
pub use returns::{
    FillMethod, Frequency, PriceTable, ReturnTable, ReturnsOptions, ReturnsRequest, process_prices,
};
pub use yahoo::{DEFAULT_PROPERTY, YahooPropertyClient, YahooQuoteProvider};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Yahoo Finance data providers.

pub mod properties;
pub mod quotes;

pub use properties::{DEFAULT_PROPERTY, YahooPropertyClient};
pub use quotes::YahooQuoteProvider;

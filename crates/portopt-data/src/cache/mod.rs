//! Caching layer for quotes and asset properties.

pub mod sqlite;

pub use sqlite::{CacheStats, SqliteCache, default_cache_path};

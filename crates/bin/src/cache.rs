//! Market data cache location and maintenance.
//!
//! The SQLite cache lives in the platform cache directory:
//! - Linux: `~/.cache/portopt/`
//! - macOS: `~/Library/Caches/portopt/`
//! - Windows: `%LOCALAPPDATA%\portopt\`

use crate::CliResult;
use crate::args::OutputFormat;
use clap::Subcommand;
use portopt_data::{DataError, SqliteCache};
use serde_json::{Value, json};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Cache maintenance actions.
#[derive(Debug, Subcommand)]
pub(crate) enum CacheAction {
    /// Show the cache location and what it holds
    Stats {
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Also report the first cached quote of this symbol
        #[arg(long)]
        symbol: Option<String>,
    },

    /// Delete cached quotes and properties
    Clear {
        /// Only delete the data of this symbol
        #[arg(long)]
        symbol: Option<String>,
    },
}

/// Get the cache database path.
pub(crate) fn cache_path() -> PathBuf {
    portopt_data::default_cache_path(dirs::cache_dir())
}

/// Open the cache, creating the directory if needed.
pub(crate) fn open_cache() -> Result<SqliteCache, DataError> {
    SqliteCache::new(cache_path())
}

pub(crate) fn run(action: CacheAction) -> CliResult<()> {
    let path = cache_path();
    if matches!(action, CacheAction::Clear { .. }) && !path.exists() {
        println!("No cache at {}", path.display());
        return Ok(());
    }
    execute(&open_cache()?, &path, action, &mut io::stdout())
}

fn execute<W: Write>(
    cache: &SqliteCache,
    path: &Path,
    action: CacheAction,
    out: &mut W,
) -> CliResult<()> {
    match action {
        CacheAction::Stats { format, symbol } => {
            let stats = cache.get_stats()?;
            let symbol = symbol.map(|s| s.to_uppercase());
            let first = match &symbol {
                Some(s) => cache.first_quote_date(s)?,
                None => None,
            };
            match format {
                OutputFormat::Text => {
                    writeln!(out, "  Cache location: {}", path.display())?;
                    writeln!(
                        out,
                        "  Cached data: {} quotes for {} symbols",
                        stats.total_quotes, stats.unique_symbols
                    )?;
                    writeln!(out, "  Cached properties: {}", stats.properties)?;
                    if let Some(s) = &symbol {
                        match first {
                            Some(date) => writeln!(out, "  {s} cached since {date}")?,
                            None => writeln!(out, "  {s} has no cached quotes")?,
                        }
                    }
                }
                OutputFormat::Json => {
                    let mut output = json!({
                        "path": path.display().to_string(),
                        "quotes": stats.total_quotes,
                        "symbols": stats.unique_symbols,
                        "properties": stats.properties,
                    });
                    if let Some(s) = symbol {
                        output["symbol"] = json!({
                            "symbol": s,
                            "first_quote": first.map_or(Value::Null, |d| json!(d.to_string())),
                        });
                    }
                    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
                }
            }
        }
        CacheAction::Clear { symbol: Some(symbol) } => {
            let symbol = symbol.to_uppercase();
            cache.clear_symbol(&symbol)?;
            writeln!(out, "Cleared {symbol} from cache at {}", path.display())?;
        }
        CacheAction::Clear { symbol: None } => {
            cache.clear_all()?;
            writeln!(out, "Cleared cache at {}", path.display())?;
        }
    }
    Ok(())
}

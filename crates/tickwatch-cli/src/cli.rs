//! CLI argument definitions for tickwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `favorites list` | Load favorites (falls back to the local cache) |
//! | `favorites add` | Add a favorite |
//! | `favorites remove` | Remove a favorite |
//! | `favorites check` | Ask the remote whether a symbol is a favorite |
//! | `stock` | Fetch daily price history |
//! | `search` | Search symbols by ticker or name |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--api-url` | `TICKWATCH_API_URL` | Base URL of the remote services |
//! | `--cache-dir` | `TICKWATCH_CACHE_DIR` | Local favorites cache directory |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! tickwatch favorites add tsla --name "Tesla"
//! tickwatch stock AAPL --days 30 --pretty
//! tickwatch search apple
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tickwatch_core::DEFAULT_RANGE_DAYS;

/// Track favorite stock symbols and view their recent price history.
#[derive(Debug, Parser)]
#[command(name = "tickwatch", author, version, about)]
pub struct Cli {
    /// Base URL of the favorites/stocks/search API.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory for the local favorites fallback cache.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log request lifecycles to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage saved favorites.
    Favorites(FavoritesArgs),

    /// Fetch daily OHLCV history for a symbol.
    ///
    /// # Examples
    ///
    ///   tickwatch stock AAPL
    ///   tickwatch stock msft --days 90 --refresh
    Stock(StockArgs),

    /// Search symbols by ticker or company name.
    Search(SearchArgs),
}

#[derive(Debug, Args)]
pub struct FavoritesArgs {
    #[command(subcommand)]
    pub command: FavoritesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List favorites.
    List,

    /// Add a favorite (re-adding moves it to the front).
    Add(AddFavoriteArgs),

    /// Remove a favorite. Removing an absent symbol succeeds.
    Remove(SymbolArg),

    /// Ask the remote service whether a symbol is a favorite.
    Check(SymbolArg),
}

#[derive(Debug, Args)]
pub struct AddFavoriteArgs {
    pub symbol: String,

    /// Display name stored with the favorite.
    #[arg(long)]
    pub name: Option<String>,

    /// Last known price.
    #[arg(long)]
    pub price: Option<f64>,
}

#[derive(Debug, Args)]
pub struct SymbolArg {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct StockArgs {
    pub symbol: String,

    /// Number of days of history (1-1000).
    #[arg(long, default_value_t = DEFAULT_RANGE_DAYS)]
    pub days: u32,

    /// Bypass cached responses.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Ticker fragment or company name (at least 2 characters).
    pub keywords: String,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_favorites_add_with_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tickwatch",
            "favorites",
            "add",
            "tsla",
            "--name",
            "Tesla",
            "--pretty",
        ])
        .expect("parse");

        assert!(cli.pretty);
        match cli.command {
            Command::Favorites(FavoritesArgs {
                command: FavoritesCommand::Add(args),
            }) => {
                assert_eq!(args.symbol, "tsla");
                assert_eq!(args.name.as_deref(), Some("Tesla"));
                assert_eq!(args.price, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn stock_defaults_to_full_range_with_cache() {
        let cli = Cli::try_parse_from(["tickwatch", "stock", "AAPL"]).expect("parse");
        match cli.command {
            Command::Stock(args) => {
                assert_eq!(args.days, 360);
                assert!(!args.refresh);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

//! # Domain Models
//!
//! Canonical types shared by the favorites synchronizer, the stock data cache
//! and the search debouncer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, upper-cased ticker |
//! | [`FavoriteEntry`] | A saved symbol with optional name and price |
//! | [`FavoritesCollection`] | Ordered favorites, unique by symbol |
//! | [`NewFavorite`] | Unvalidated add input |
//! | [`DailyBar`] | One day of OHLCV data |
//! | [`NormalizedStockRecord`] | Metadata plus a newest-first bar series |
//! | [`SearchResult`] | Transient symbol-search hit |
//! | [`TradingDate`] | `YYYY-MM-DD` calendar date |
//! | [`UtcDateTime`] | ISO-8601 instant normalized to UTC |
//!
//! Constructors enforce invariants and return [`ValidationError`](crate::ValidationError)
//! on bad input.

mod date;
mod favorites;
mod models;
mod symbol;
mod timestamp;

pub use date::TradingDate;
pub use favorites::{FavoriteEntry, FavoritesCollection, NewFavorite};
pub use models::{
    validate_range_days, DailyBar, NormalizedStockRecord, SearchResult, StockMetadata,
    DEFAULT_RANGE_DAYS, MAX_RANGE_DAYS, MIN_RANGE_DAYS,
};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;

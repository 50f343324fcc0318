//! # Tickwatch Core
//!
//! Client-side state reconciliation for a stock favorites tracker.
//!
//! ## Overview
//!
//! - **Favorites synchronizer**: optimistic add/remove with rollback,
//!   periodic refresh and a local-cache fallback when the remote is down
//! - **Stock data cache**: one "current stock" slot whose stale results are
//!   discarded by generation token
//! - **Search debouncer**: quiet-period coalescing and result ranking
//! - **Remote collaborators** behind traits, with HTTP implementations
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL response cache used by the HTTP stock service |
//! | [`client`] | [`TickwatchClient`] wiring |
//! | [`config`] | Timeouts, intervals and environment overrides |
//! | [`domain`] | Symbols, favorites, bars, stock records, search results |
//! | [`error`] | Error types |
//! | [`favorites`] | [`FavoritesSynchronizer`] |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`local_cache`] | Persistent local fallback store |
//! | [`remote`] | Remote service traits and HTTP implementations |
//! | [`search`] | [`SearchDebouncer`] |
//! | [`state`] | Request lifecycle state |
//! | [`stock_cache`] | [`StockDataCache`] |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickwatch_core::{ClientConfig, NewFavorite, TickwatchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TickwatchClient::from_config(&ClientConfig::from_env()?);
//!
//!     client.favorites().load().await?;
//!     client.favorites().add(NewFavorite::new("tsla")).await?;
//!     assert!(client.favorites().is_favorite("TSLA"));
//!
//!     let record = client.stocks().fetch("AAPL", 30, true).await?;
//!     if let Some(bar) = record.latest() {
//!         println!("{} closed at {:.2}", record.symbol(), bar.close);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐  ┌────────────────┐  ┌─────────────────┐
//! │ FavoritesSynchronizer│  │ StockDataCache │  │ SearchDebouncer │
//! └───┬──────────────┬───┘  └───────┬────────┘  └────────┬────────┘
//!     │              │              │                    │
//!     ▼              ▼              ▼                    ▼
//! ┌────────────┐ ┌──────────────────────┐ ┌──────────────────────┐
//! │ Persistent │ │RemoteFavoritesService│ │  RemoteStockService  │
//! │ LocalCache │ └──────────┬───────────┘ └──────────┬───────────┘
//! └────────────┘            │                        │
//!                           ▼                        ▼
//!                    ┌──────────────────────────────────┐
//!                    │ HttpClient (reqwest)             │
//!                    └──────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every public operation returns [`ClientError`]; transport failures are
//! translated at the component boundary.
//!
//! ```rust
//! use tickwatch_core::{ClientError, ErrorKind};
//!
//! fn describe(error: &ClientError) -> &'static str {
//!     match error.kind() {
//!         ErrorKind::Validation => "check the symbol",
//!         ErrorKind::NotFound => "nothing there",
//!         ErrorKind::Timeout | ErrorKind::RemoteUnavailable => "try again",
//!         ErrorKind::RemoteRejected => "server said no",
//!     }
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod favorites;
pub mod http_client;
pub mod local_cache;
pub mod remote;
pub mod search;
pub mod state;
pub mod stock_cache;

// Components
pub use client::TickwatchClient;
pub use favorites::{FavoritesSnapshot, FavoritesSynchronizer, RefreshHandle};
pub use search::{rank_results, SearchDebouncer};
pub use state::RequestState;
pub use stock_cache::StockDataCache;

// Caching
pub use cache::{CacheMode, ResponseCache};
pub use local_cache::{FileLocalCache, MemoryLocalCache, PersistentLocalCache};

// Configuration
pub use config::{ClientConfig, FavoritesConfig, SearchConfig, StockConfig};

// Domain models
pub use domain::{
    validate_range_days, DailyBar, FavoriteEntry, FavoritesCollection, NewFavorite,
    NormalizedStockRecord, SearchResult, StockMetadata, Symbol, TradingDate, UtcDateTime,
    DEFAULT_RANGE_DAYS, MAX_RANGE_DAYS, MIN_RANGE_DAYS,
};

// Error types
pub use error::{ClientError, ConfigError, ErrorKind, LocalCacheError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Remote services
pub use remote::http::{HttpFavoritesService, HttpStockService};
pub use remote::{
    RemoteError, RemoteErrorKind, RemoteFavoritesService, RemoteFuture, RemoteStockService,
    SeriesRequest,
};

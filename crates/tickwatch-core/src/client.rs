use std::sync::Arc;

use crate::config::ClientConfig;
use crate::favorites::FavoritesSynchronizer;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::local_cache::{FileLocalCache, PersistentLocalCache};
use crate::remote::http::{HttpFavoritesService, HttpStockService};
use crate::remote::{RemoteFavoritesService, RemoteStockService};
use crate::search::SearchDebouncer;
use crate::stock_cache::StockDataCache;

/// The three reconciliation components wired to shared collaborators.
#[derive(Clone)]
pub struct TickwatchClient {
    favorites: FavoritesSynchronizer,
    stocks: StockDataCache,
    search: SearchDebouncer,
}

impl TickwatchClient {
    /// HTTP services against `config.api_url` and a file cache in
    /// `config.cache_dir`.
    pub fn from_config(config: &ClientConfig) -> Self {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
        Self::with_http(config, http)
    }

    /// Same as [`from_config`](Self::from_config) over a custom transport.
    pub fn with_http(config: &ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        let favorites_service = HttpFavoritesService::new(Arc::clone(&http), config.api_url.clone())
            .with_timeouts(config.favorites.request_timeout, config.favorites.check_timeout);
        let stock_service = HttpStockService::new(http, config.api_url.clone())
            .with_timeouts(config.stock.fetch_timeout, config.search.timeout)
            .with_series_ttl(config.stock.series_ttl);

        Self::with_services(
            config,
            Arc::new(favorites_service),
            Arc::new(stock_service),
            Arc::new(FileLocalCache::new(config.cache_dir.clone())),
        )
    }

    pub fn with_services(
        config: &ClientConfig,
        favorites_service: Arc<dyn RemoteFavoritesService>,
        stock_service: Arc<dyn RemoteStockService>,
        local_cache: Arc<dyn PersistentLocalCache>,
    ) -> Self {
        Self {
            favorites: FavoritesSynchronizer::new(
                favorites_service,
                local_cache,
                config.favorites.clone(),
            ),
            stocks: StockDataCache::new(Arc::clone(&stock_service), config.stock),
            search: SearchDebouncer::new(stock_service, config.search),
        }
    }

    pub fn favorites(&self) -> &FavoritesSynchronizer {
        &self.favorites
    }

    pub fn stocks(&self) -> &StockDataCache {
        &self.stocks
    }

    pub fn search(&self) -> &SearchDebouncer {
        &self.search
    }
}

//! Single-slot cache for the price series currently being viewed.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::StockConfig;
use crate::remote::{bounded, RemoteStockService, SeriesRequest};
use crate::state::{RequestState, Slot};
use crate::{validate_range_days, ClientError, NormalizedStockRecord, Symbol, DEFAULT_RANGE_DAYS};

struct Inner {
    remote: Arc<dyn RemoteStockService>,
    config: StockConfig,
    slot: Slot<NormalizedStockRecord>,
}

/// Holds one logical "current stock" slot.
///
/// Each `fetch` supersedes the previous one: once a newer call has started,
/// an older call's outcome is still returned to its own caller but never
/// written to the slot.
#[derive(Clone)]
pub struct StockDataCache {
    inner: Arc<Inner>,
}

impl StockDataCache {
    pub fn new(remote: Arc<dyn RemoteStockService>, config: StockConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                config,
                slot: Slot::new(),
            }),
        }
    }

    /// Loads `range_days` of history for `symbol`.
    ///
    /// Invalid input fails before the slot is touched, so an outstanding
    /// fetch is not superseded by it. `allow_cache = false` is forwarded to
    /// the remote service as a bypass directive. An empty series fails with
    /// [`ClientError::EmptySeries`]. Any remote failure leaves the slot
    /// without data.
    pub async fn fetch(
        &self,
        symbol: &str,
        range_days: u32,
        allow_cache: bool,
    ) -> Result<NormalizedStockRecord, ClientError> {
        let request = SeriesRequest {
            symbol: Symbol::parse(symbol)?,
            range_days: validate_range_days(range_days)?,
            allow_cache,
        };
        let ticket = self.inner.slot.begin();
        let flight = self.inner.slot.in_flight(ticket);

        let result = self.request(request).await;
        let next = match &result {
            Ok(record) => RequestState::Loaded(record.clone()),
            Err(error) => RequestState::Failed(error.clone()),
        };
        if !flight.finish(next) {
            debug!(symbol, "discarding superseded stock fetch result");
        }
        result
    }

    /// [`fetch`](Self::fetch) with the default range and cache allowed.
    pub async fn fetch_default(&self, symbol: &str) -> Result<NormalizedStockRecord, ClientError> {
        self.fetch(symbol, DEFAULT_RANGE_DAYS, true).await
    }

    /// Always bypasses caches.
    pub async fn refresh(
        &self,
        symbol: &str,
        range_days: u32,
    ) -> Result<NormalizedStockRecord, ClientError> {
        self.fetch(symbol, range_days, false).await
    }

    /// Resets to idle, discarding any outstanding fetch.
    pub fn clear(&self) {
        self.inner.slot.reset();
    }

    pub fn state(&self) -> RequestState<NormalizedStockRecord> {
        self.inner.slot.get()
    }

    pub fn current(&self) -> Option<NormalizedStockRecord> {
        self.state().data().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<NormalizedStockRecord>> {
        self.inner.slot.subscribe()
    }

    async fn request(&self, request: SeriesRequest) -> Result<NormalizedStockRecord, ClientError> {
        let symbol = request.symbol.clone();
        debug!(
            symbol = %symbol,
            range_days = request.range_days,
            allow_cache = request.allow_cache,
            "fetching stock series"
        );

        let limit = self.inner.config.fetch_timeout;
        let record = bounded("stock fetch", limit, self.inner.remote.series(request))
            .await
            .inspect_err(|error| warn!(symbol = %symbol, error = %error, "stock fetch failed"))?;

        if record.is_empty() {
            return Err(ClientError::EmptySeries { symbol });
        }
        Ok(record)
    }
}

//! HTTP implementations of the remote collaborators.
//!
//! # Routes
//!
//! | Call | Route |
//! |------|-------|
//! | favorites list | `GET /api/favorites` |
//! | favorites add | `POST /api/favorites` `{symbol, name}` |
//! | favorites remove | `DELETE /api/favorites/{symbol}` |
//! | favorites contains | `GET /api/favorites/{symbol}/status` |
//! | price series | `GET /api/stocks?symbol=S&days=N` |
//! | symbol search | `GET /api/search?keywords=K` |
//!
//! Non-2xx bodies are mined for a `detail`, `error` or `message` string which
//! is passed through unchanged.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{RemoteError, RemoteFavoritesService, RemoteFuture, RemoteStockService, SeriesRequest};
use crate::cache::{CacheMode, ResponseCache};
use crate::domain::{
    DailyBar, FavoriteEntry, NormalizedStockRecord, SearchResult, StockMetadata, Symbol,
    TradingDate, UtcDateTime,
};
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

#[derive(Clone)]
struct Endpoint {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl Endpoint {
    fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
        debug!(method = request.method.as_str(), url = %request.url, "remote request");
        let response = self.http.execute(request).await.map_err(transport_error)?;
        if response.is_success() {
            return Ok(response);
        }

        let message = error_message(&response.body)
            .unwrap_or_else(|| format!("upstream returned status {}", response.status));
        if response.status == 404 {
            Err(RemoteError::not_found(message))
        } else {
            Err(RemoteError::rejected(response.status, message))
        }
    }
}

fn transport_error(error: HttpError) -> RemoteError {
    if error.is_timeout() {
        RemoteError::timeout(error.message())
    } else {
        RemoteError::transport(error.message())
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

fn decode<'de, T: Deserialize<'de>>(body: &'de str, what: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body)
        .map_err(|error| RemoteError::malformed(format!("failed to decode {what}: {error}")))
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

/// Favorites store reached over HTTP.
#[derive(Clone)]
pub struct HttpFavoritesService {
    endpoint: Endpoint,
    request_timeout: Duration,
    check_timeout: Duration,
}

impl HttpFavoritesService {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(http, base_url),
            request_timeout: Duration::from_secs(10),
            check_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeouts(mut self, request_timeout: Duration, check_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.check_timeout = check_timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct FavoriteWire {
    symbol: String,
    #[serde(default, alias = "displayName")]
    name: Option<String>,
    #[serde(default, alias = "addedAt")]
    added_at: Option<String>,
    #[serde(default, alias = "lastPrice")]
    last_price: Option<f64>,
}

impl FavoriteWire {
    fn into_entry(self) -> Result<FavoriteEntry, RemoteError> {
        let invalid = |error: crate::ValidationError| {
            RemoteError::malformed(format!("invalid favorite '{}': {error}", self.symbol))
        };
        let symbol = Symbol::parse(&self.symbol).map_err(invalid)?;
        let added_at = match self.added_at.as_deref() {
            Some(raw) => UtcDateTime::parse(raw).map_err(invalid)?,
            None => UtcDateTime::now(),
        };
        FavoriteEntry::new(symbol, self.name.clone(), added_at, self.last_price).map_err(invalid)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FavoritesListWire {
    Wrapped { favorites: Vec<FavoriteWire> },
    Bare(Vec<FavoriteWire>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FavoriteAddWire {
    Wrapped { favorite: FavoriteWire },
    Bare(FavoriteWire),
}

#[derive(Debug, Serialize)]
struct FavoriteAddBody<'a> {
    symbol: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct FavoriteStatusWire {
    #[serde(rename = "isFavorite", alias = "is_favorite")]
    is_favorite: bool,
}

impl RemoteFavoritesService for HttpFavoritesService {
    fn list(&self) -> RemoteFuture<'_, Vec<FavoriteEntry>> {
        Box::pin(async move {
            let request =
                HttpRequest::get(self.endpoint.url("/api/favorites")).with_timeout(self.request_timeout);
            let response = self.endpoint.send(request).await?;
            let wires = match decode::<FavoritesListWire>(&response.body, "favorites list")? {
                FavoritesListWire::Wrapped { favorites } => favorites,
                FavoritesListWire::Bare(favorites) => favorites,
            };
            // One unreadable row should not hide the rest of the list.
            let entries = wires
                .into_iter()
                .filter_map(|wire| match wire.into_entry() {
                    Ok(entry) => Some(entry),
                    Err(error) => {
                        warn!(error = %error, "skipping unreadable favorite");
                        None
                    }
                })
                .collect();
            Ok(entries)
        })
    }

    fn add<'a>(
        &'a self,
        symbol: &'a Symbol,
        display_name: Option<&'a str>,
    ) -> RemoteFuture<'a, FavoriteEntry> {
        Box::pin(async move {
            let body = serde_json::to_string(&FavoriteAddBody {
                symbol: symbol.as_str(),
                name: display_name,
            })
            .map_err(|error| RemoteError::malformed(error.to_string()))?;
            let request = HttpRequest::post(self.endpoint.url("/api/favorites"))
                .with_json_body(body)
                .with_timeout(self.request_timeout);
            let response = self.endpoint.send(request).await?;
            match decode::<FavoriteAddWire>(&response.body, "added favorite")? {
                FavoriteAddWire::Wrapped { favorite } => favorite.into_entry(),
                FavoriteAddWire::Bare(favorite) => favorite.into_entry(),
            }
        })
    }

    fn remove<'a>(&'a self, symbol: &'a Symbol) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let path = format!("/api/favorites/{}", symbol.path_segment());
            let request = HttpRequest::delete(self.endpoint.url(&path)).with_timeout(self.request_timeout);
            self.endpoint.send(request).await.map(|_| ())
        })
    }

    fn contains<'a>(&'a self, symbol: &'a Symbol) -> RemoteFuture<'a, bool> {
        Box::pin(async move {
            let path = format!("/api/favorites/{}/status", symbol.path_segment());
            let request = HttpRequest::get(self.endpoint.url(&path)).with_timeout(self.check_timeout);
            let response = self.endpoint.send(request).await?;
            decode::<FavoriteStatusWire>(&response.body, "favorite status").map(|s| s.is_favorite)
        })
    }
}

// ---------------------------------------------------------------------------
// Stocks
// ---------------------------------------------------------------------------

/// Market-data proxy reached over HTTP, with its own short-lived response
/// cache for price series.
#[derive(Clone)]
pub struct HttpStockService {
    endpoint: Endpoint,
    series_timeout: Duration,
    search_timeout: Duration,
    series_cache: ResponseCache<NormalizedStockRecord>,
}

impl HttpStockService {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(http, base_url),
            series_timeout: Duration::from_secs(30),
            search_timeout: Duration::from_secs(10),
            series_cache: ResponseCache::new(Duration::from_secs(300)),
        }
    }

    pub fn with_timeouts(mut self, series_timeout: Duration, search_timeout: Duration) -> Self {
        self.series_timeout = series_timeout;
        self.search_timeout = search_timeout;
        self
    }

    pub fn with_series_ttl(mut self, ttl: Duration) -> Self {
        self.series_cache = ResponseCache::new(ttl);
        self
    }

    async fn fetch_series(&self, request: &SeriesRequest) -> Result<NormalizedStockRecord, RemoteError> {
        let url = format!(
            "{}?symbol={}&days={}",
            self.endpoint.url("/api/stocks"),
            urlencoding::encode(request.symbol.as_str()),
            request.range_days
        );
        let mut http_request = HttpRequest::get(url).with_timeout(self.series_timeout);
        if !request.allow_cache {
            http_request = http_request.with_header("cache-control", "no-cache");
        }

        let response = self.endpoint.send(http_request).await?;
        decode::<StockRecordWire>(&response.body, "stock series")?.into_record()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockMetadataWire {
    symbol: String,
    #[serde(default)]
    last_refreshed: String,
    #[serde(default)]
    time_zone: String,
}

#[derive(Debug, Deserialize)]
struct DailyBarWire {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StockRecordWire {
    metadata: StockMetadataWire,
    #[serde(default, alias = "series")]
    data: Vec<DailyBarWire>,
}

impl StockRecordWire {
    fn into_record(self) -> Result<NormalizedStockRecord, RemoteError> {
        let invalid = |error: crate::ValidationError| RemoteError::malformed(error.to_string());

        let metadata = StockMetadata {
            symbol: Symbol::parse(&self.metadata.symbol).map_err(invalid)?,
            last_refreshed: self.metadata.last_refreshed,
            time_zone: self.metadata.time_zone,
        };

        let series = self
            .data
            .into_iter()
            .map(|bar| {
                let date = TradingDate::parse(&bar.date)?;
                if !bar.volume.is_finite() || bar.volume < 0.0 {
                    return Err(crate::ValidationError::NegativeValue { field: "volume" });
                }
                let time = bar
                    .time
                    .unwrap_or_else(|| date.into_inner().midnight().assume_utc().unix_timestamp());
                DailyBar::new(date, bar.open, bar.high, bar.low, bar.close, bar.volume as u64, time)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        NormalizedStockRecord::new(metadata, series).map_err(invalid)
    }
}

impl RemoteStockService for HttpStockService {
    fn series(&self, request: SeriesRequest) -> RemoteFuture<'_, NormalizedStockRecord> {
        Box::pin(async move {
            let key = format!("series:{}:{}", request.symbol, request.range_days);
            let mode = CacheMode::from_allow_cache(request.allow_cache);
            if let Some(record) = self.series_cache.lookup(&key, mode).await {
                debug!(symbol = %request.symbol, "series served from response cache");
                return Ok(record);
            }

            let record = self.fetch_series(&request).await?;
            self.series_cache.store(key, record.clone()).await;
            Ok(record)
        })
    }

    fn search<'a>(&'a self, keywords: &'a str) -> RemoteFuture<'a, Vec<SearchResult>> {
        Box::pin(async move {
            let url = format!(
                "{}?keywords={}",
                self.endpoint.url("/api/search"),
                urlencoding::encode(keywords)
            );
            let request = HttpRequest::get(url).with_timeout(self.search_timeout);
            let response = self.endpoint.send(request).await?;
            decode(&response.body, "search results")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail":"Symbol not found","error":"x"}"#).as_deref(),
            Some("Symbol not found")
        );
        assert_eq!(
            error_message(r#"{"error":"Failed to add favorite"}"#).as_deref(),
            Some("Failed to add favorite")
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn bars_without_time_use_midnight_utc() {
        let wire: StockRecordWire = serde_json::from_str(
            r#"{"metadata":{"symbol":"aapl","lastRefreshed":"2024-01-02","timeZone":"US/Eastern"},
                "data":[{"date":"2024-01-02","open":1,"high":2,"low":0.5,"close":1.5,"volume":10}]}"#,
        )
        .expect("wire");

        let record = wire.into_record().expect("record");
        assert_eq!(record.symbol().as_str(), "AAPL");
        assert_eq!(record.series[0].time, 1_704_153_600);
    }

    #[test]
    fn favorite_wire_accepts_server_field_names() {
        let wire: FavoriteWire = serde_json::from_str(
            r#"{"id":"1","stock_id":"2","symbol":"nvda","name":"NVIDIA","added_at":"2024-05-01T10:00:00+00:00","last_price":880.5}"#,
        )
        .expect("wire");

        let entry = wire.into_entry().expect("entry");
        assert_eq!(entry.symbol.as_str(), "NVDA");
        assert_eq!(entry.display_name.as_deref(), Some("NVIDIA"));
        assert_eq!(entry.last_price, Some(880.5));
    }
}

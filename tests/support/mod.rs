//! In-process fakes shared by the behavior tests.
//!
//! Remote calls can be held open with a [`Gate`]: arm it, start the call,
//! `wait_entered()` to observe intermediate state, then `release()`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickwatch_core::{
    DailyBar, FavoriteEntry, LocalCacheError, NormalizedStockRecord, PersistentLocalCache,
    RemoteError, RemoteFavoritesService, RemoteFuture, RemoteStockService, SearchResult,
    SeriesRequest, StockMetadata, Symbol, TradingDate, UtcDateTime,
};
use tokio::sync::Notify;

// =============================================================================
// Gates
// =============================================================================

#[derive(Default)]
pub struct Gate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub async fn pass(&self) {
        if self.armed.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

pub fn entry(raw: &str) -> FavoriteEntry {
    FavoriteEntry::new(
        symbol(raw),
        None,
        UtcDateTime::parse("2024-05-01T12:00:00Z").expect("timestamp"),
        None,
    )
    .expect("valid entry")
}

pub fn named_entry(raw: &str, name: &str) -> FavoriteEntry {
    FavoriteEntry {
        display_name: Some(name.to_owned()),
        ..entry(raw)
    }
}

pub fn record(raw: &str, bars: usize) -> NormalizedStockRecord {
    let series = (0..bars)
        .map(|offset| {
            let date = TradingDate::parse(&format!("2024-03-{:02}", offset + 1)).expect("date");
            let close = 100.0 + offset as f64;
            DailyBar::new(date, close, close + 2.0, close - 2.0, close, 1_000_000, 0)
                .expect("valid bar")
        })
        .collect();
    NormalizedStockRecord::new(
        StockMetadata {
            symbol: symbol(raw),
            last_refreshed: String::from("2024-03-29"),
            time_zone: String::from("US/Eastern"),
        },
        series,
    )
    .expect("valid record")
}

pub fn search_result(symbol: &str, name: &str) -> SearchResult {
    SearchResult {
        symbol: symbol.to_owned(),
        name: name.to_owned(),
        instrument_type: String::from("Equity"),
        region: String::from("United States"),
        currency: String::from("USD"),
    }
}

// =============================================================================
// Remote favorites
// =============================================================================

/// Scripted outcome for one kind of remote call.
#[derive(Clone)]
pub enum Script {
    Succeed,
    Fail(RemoteError),
    /// Never completes; only a timeout ends the call.
    Hang,
}

/// Favorites service backed by an in-memory "server" list.
pub struct FakeFavoritesService {
    server: Mutex<Vec<FavoriteEntry>>,
    list_script: Mutex<Script>,
    add_script: Mutex<Script>,
    remove_script: Mutex<Script>,
    pub list_gate: Gate,
    pub add_gate: Gate,
    pub remove_gate: Gate,
    pub list_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
}

impl FakeFavoritesService {
    pub fn new(server: Vec<FavoriteEntry>) -> Arc<Self> {
        Arc::new(Self {
            server: Mutex::new(server),
            list_script: Mutex::new(Script::Succeed),
            add_script: Mutex::new(Script::Succeed),
            remove_script: Mutex::new(Script::Succeed),
            list_gate: Gate::default(),
            add_gate: Gate::default(),
            remove_gate: Gate::default(),
            list_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
        })
    }

    pub fn script_list(&self, script: Script) {
        *self.list_script.lock().expect("lock") = script;
    }

    pub fn script_add(&self, script: Script) {
        *self.add_script.lock().expect("lock") = script;
    }

    pub fn script_remove(&self, script: Script) {
        *self.remove_script.lock().expect("lock") = script;
    }

    pub fn set_server(&self, entries: Vec<FavoriteEntry>) {
        *self.server.lock().expect("lock") = entries;
    }

    pub fn server_symbols(&self) -> Vec<String> {
        self.server
            .lock()
            .expect("lock")
            .iter()
            .map(|entry| entry.symbol.to_string())
            .collect()
    }

    async fn run<T>(script: Script, ok: impl FnOnce() -> Result<T, RemoteError>) -> Result<T, RemoteError> {
        match script {
            Script::Succeed => ok(),
            Script::Fail(error) => Err(error),
            Script::Hang => std::future::pending().await,
        }
    }
}

impl RemoteFavoritesService for FakeFavoritesService {
    fn list(&self) -> RemoteFuture<'_, Vec<FavoriteEntry>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.list_gate.pass().await;
            let script = self.list_script.lock().expect("lock").clone();
            Self::run(script, || Ok(self.server.lock().expect("lock").clone())).await
        })
    }

    fn add<'a>(
        &'a self,
        symbol: &'a Symbol,
        display_name: Option<&'a str>,
    ) -> RemoteFuture<'a, FavoriteEntry> {
        Box::pin(async move {
            self.add_calls.fetch_add(1, Ordering::SeqCst);
            self.add_gate.pass().await;
            let script = self.add_script.lock().expect("lock").clone();
            Self::run(script, || {
                let confirmed = FavoriteEntry {
                    display_name: display_name.map(str::to_owned),
                    ..entry(symbol.as_str())
                };
                let mut server = self.server.lock().expect("lock");
                server.retain(|existing| &existing.symbol != symbol);
                server.insert(0, confirmed.clone());
                Ok(confirmed)
            })
            .await
        })
    }

    fn remove<'a>(&'a self, symbol: &'a Symbol) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            self.remove_calls.fetch_add(1, Ordering::SeqCst);
            self.remove_gate.pass().await;
            let script = self.remove_script.lock().expect("lock").clone();
            Self::run(script, || {
                let mut server = self.server.lock().expect("lock");
                let before = server.len();
                server.retain(|existing| &existing.symbol != symbol);
                if server.len() == before {
                    return Err(RemoteError::not_found("Favorite not found"));
                }
                Ok(())
            })
            .await
        })
    }

    fn contains<'a>(&'a self, symbol: &'a Symbol) -> RemoteFuture<'a, bool> {
        Box::pin(async move {
            Ok(self
                .server
                .lock()
                .expect("lock")
                .iter()
                .any(|existing| &existing.symbol == symbol))
        })
    }
}

// =============================================================================
// Remote stocks
// =============================================================================

#[derive(Clone)]
pub struct SeriesScript {
    pub delay: Duration,
    pub outcome: Result<NormalizedStockRecord, RemoteError>,
}

/// Stock service answering per symbol after a scripted delay.
#[derive(Default)]
pub struct FakeStockService {
    series: Mutex<HashMap<String, SeriesScript>>,
    search_outcome: Mutex<Option<Result<Vec<SearchResult>, RemoteError>>>,
    search_hangs: AtomicBool,
    pub series_requests: Mutex<Vec<SeriesRequest>>,
    pub search_queries: Mutex<Vec<String>>,
}

impl FakeStockService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_series(&self, raw: &str, delay: Duration, outcome: Result<NormalizedStockRecord, RemoteError>) {
        self.series
            .lock()
            .expect("lock")
            .insert(symbol(raw).to_string(), SeriesScript { delay, outcome });
    }

    pub fn script_search(&self, outcome: Result<Vec<SearchResult>, RemoteError>) {
        *self.search_outcome.lock().expect("lock") = Some(outcome);
    }

    pub fn hang_search(&self) {
        self.search_hangs.store(true, Ordering::SeqCst);
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_queries.lock().expect("lock").clone()
    }

    pub fn series_requests(&self) -> Vec<SeriesRequest> {
        self.series_requests.lock().expect("lock").clone()
    }
}

impl RemoteStockService for FakeStockService {
    fn series(&self, request: SeriesRequest) -> RemoteFuture<'_, NormalizedStockRecord> {
        Box::pin(async move {
            self.series_requests.lock().expect("lock").push(request.clone());
            let script = self
                .series
                .lock()
                .expect("lock")
                .get(request.symbol.as_str())
                .cloned();
            let Some(script) = script else {
                return Err(RemoteError::not_found(format!("no data for {}", request.symbol)));
            };
            tokio::time::sleep(script.delay).await;
            script.outcome
        })
    }

    fn search<'a>(&'a self, keywords: &'a str) -> RemoteFuture<'a, Vec<SearchResult>> {
        Box::pin(async move {
            self.search_queries.lock().expect("lock").push(keywords.to_owned());
            if self.search_hangs.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.search_outcome
                .lock()
                .expect("lock")
                .clone()
                .unwrap_or_else(|| Ok(Vec::new()))
        })
    }
}

// =============================================================================
// Local cache
// =============================================================================

/// Local cache whose writes always fail.
#[derive(Default)]
pub struct FailingLocalCache {
    pub write_attempts: AtomicUsize,
}

impl PersistentLocalCache for FailingLocalCache {
    fn read(&self, _key: &str) -> Result<Option<String>, LocalCacheError> {
        Err(LocalCacheError::Unavailable(String::from("storage disabled")))
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), LocalCacheError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(LocalCacheError::Unavailable(String::from("quota exceeded")))
    }
}

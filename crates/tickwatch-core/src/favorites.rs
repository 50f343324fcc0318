//! Favorites synchronizer.
//!
//! Owns the in-memory [`FavoritesCollection`] and keeps it consistent with
//! the remote favorites service and the persistent local cache.
//!
//! - `add`/`remove` apply an optimistic change first and then either confirm
//!   it or compensate by restoring the captured prior entry at its index.
//! - Each mutation takes a per-symbol token; only the latest mutation for a
//!   symbol may touch that symbol when it settles. Overlapping mutations on
//!   one symbol share a baseline: the last remotely confirmed entry (or its
//!   absence). A failed latest mutation restores that baseline, so a rollback
//!   never resurrects another mutation's unconfirmed optimistic state.
//! - `load` replaces the collection wholesale. It may overwrite a pending
//!   optimistic change; the mutation's own settlement is applied afterwards.
//! - The local cache is written after every successful change and read only
//!   when a load fails while the collection is empty.
//!
//! All state changes happen inside a single `watch` update so the
//! unique-by-symbol invariant holds at every observable instant.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::FavoritesConfig;
use crate::local_cache::PersistentLocalCache;
use crate::remote::{bounded, RemoteFavoritesService};
use crate::{
    ClientError, ErrorKind, FavoriteEntry, FavoritesCollection, NewFavorite, Symbol, UtcDateTime,
};

/// Observable state of the synchronizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesSnapshot {
    pub entries: FavoritesCollection,
    /// `true` while at least one `load` is outstanding.
    pub loading: bool,
    /// Most recent load or mutation failure. Cleared by a successful load.
    pub error: Option<ClientError>,
}

/// Latest unsettled mutation for one symbol.
struct PendingMutation {
    token: u64,
    /// Confirmed state the symbol returns to if the latest mutation fails.
    baseline: Option<(usize, FavoriteEntry)>,
}

/// How the remote answered one mutation.
enum Settlement {
    Added(FavoriteEntry),
    Removed,
    Failed(ClientError),
}

struct Inner {
    remote: Arc<dyn RemoteFavoritesService>,
    local: Arc<dyn PersistentLocalCache>,
    config: FavoritesConfig,
    state: watch::Sender<FavoritesSnapshot>,
    // Unsettled mutations per symbol. Locked only inside `state` updates.
    pending: Mutex<HashMap<Symbol, PendingMutation>>,
    next_token: AtomicU64,
    loads_in_flight: AtomicUsize,
}

/// Injectable favorites store. Clones share state.
#[derive(Clone)]
pub struct FavoritesSynchronizer {
    inner: Arc<Inner>,
}

impl FavoritesSynchronizer {
    pub fn new(
        remote: Arc<dyn RemoteFavoritesService>,
        local: Arc<dyn PersistentLocalCache>,
        config: FavoritesConfig,
    ) -> Self {
        let (state, _) = watch::channel(FavoritesSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                remote,
                local,
                config,
                state,
                pending: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(0),
                loads_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn snapshot(&self) -> FavoritesSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn favorites(&self) -> FavoritesCollection {
        self.inner.state.borrow().entries.clone()
    }

    pub fn last_error(&self) -> Option<ClientError> {
        self.inner.state.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FavoritesSnapshot> {
        self.inner.state.subscribe()
    }

    /// Case-insensitive lookup against the current in-memory collection.
    pub fn is_favorite(&self, symbol: &str) -> bool {
        match Symbol::parse(symbol) {
            Ok(symbol) => self.inner.state.borrow().entries.contains(&symbol),
            Err(_) => false,
        }
    }

    /// Refreshes the whole collection from the remote service.
    pub async fn load(&self) -> Result<FavoritesCollection, ClientError> {
        let _loading = LoadingGuard::enter(&self.inner);
        let limit = self.inner.config.request_timeout;

        match bounded("favorites load", limit, self.inner.remote.list()).await {
            Ok(entries) => {
                let collection = FavoritesCollection::from(entries);
                debug!(count = collection.len(), "favorites loaded");
                self.inner.state.send_modify(|state| {
                    state.entries = collection.clone();
                    state.error = None;
                    self.inner.mirror(&state.entries);
                });
                Ok(collection)
            }
            Err(error) => {
                warn!(error = %error, "favorites load failed");
                let fallback = if self.inner.state.borrow().entries.is_empty() {
                    self.inner.read_local()
                } else {
                    None
                };
                self.inner.state.send_modify(|state| {
                    if state.entries.is_empty() {
                        if let Some(fallback) = fallback {
                            warn!(count = fallback.len(), "showing favorites from local cache");
                            state.entries = fallback;
                        }
                    }
                    state.error = Some(error.clone());
                });
                Err(error)
            }
        }
    }

    /// Optimistically adds (or re-adds) a favorite, then confirms it remotely.
    ///
    /// The entry is placed first immediately. On failure the symbol returns to
    /// its last confirmed state and the error is returned.
    pub async fn add(&self, favorite: NewFavorite) -> Result<FavoriteEntry, ClientError> {
        let optimistic = favorite.into_entry(UtcDateTime::now())?;
        let symbol = optimistic.symbol.clone();
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst) + 1;

        let mut replaced = false;
        self.inner.state.send_modify(|state| {
            let prior = state.entries.upsert_front(optimistic.clone());
            replaced = prior.is_some();
            self.inner.begin_mutation(&symbol, token, prior);
        });
        debug!(symbol = %symbol, replaced, "optimistic favorite add");

        let limit = self.inner.config.request_timeout;
        let call = self
            .inner
            .remote
            .add(&symbol, optimistic.display_name.as_deref());

        match bounded("favorites add", limit, call).await {
            Ok(mut confirmed) => {
                if confirmed.last_price.is_none() {
                    confirmed.last_price = optimistic.last_price;
                }
                self.inner.settle(&symbol, token, Settlement::Added(confirmed.clone()));
                Ok(confirmed)
            }
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "favorite add failed, rolling back");
                self.inner.settle(&symbol, token, Settlement::Failed(error.clone()));
                Err(error)
            }
        }
    }

    /// Optimistically removes a favorite, then confirms it remotely.
    ///
    /// Removing a symbol that is not in the collection is a no-op. A remote
    /// not-found keeps the removal; any other failure restores the entry.
    pub async fn remove(&self, symbol: &str) -> Result<(), ClientError> {
        let symbol = Symbol::parse(symbol)?;
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst) + 1;

        let mut removed_at = None;
        self.inner.state.send_if_modified(|state| {
            let Some(prior) = state.entries.remove(&symbol) else {
                return false;
            };
            removed_at = Some(prior.0);
            self.inner.begin_mutation(&symbol, token, Some(prior));
            true
        });
        let Some(index) = removed_at else {
            debug!(symbol = %symbol, "favorite not present, nothing to remove");
            return Ok(());
        };
        debug!(symbol = %symbol, index, "optimistic favorite remove");

        let limit = self.inner.config.request_timeout;
        match bounded("favorites remove", limit, self.inner.remote.remove(&symbol)).await {
            Ok(()) => {
                self.inner.settle(&symbol, token, Settlement::Removed);
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(symbol = %symbol, "remote had no such favorite, keeping removal");
                self.inner.settle(&symbol, token, Settlement::Removed);
                Ok(())
            }
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "favorite remove failed, rolling back");
                self.inner.settle(&symbol, token, Settlement::Failed(error.clone()));
                Err(error)
            }
        }
    }

    /// Asks the remote service whether `symbol` is a favorite. Leaves local
    /// state untouched.
    pub async fn check_remote(&self, symbol: &str) -> Result<bool, ClientError> {
        let symbol = Symbol::parse(symbol)?;
        let limit = self.inner.config.check_timeout;
        bounded("favorites check", limit, self.inner.remote.contains(&symbol)).await
    }

    /// Calls [`load`](Self::load) every `refresh_interval` until the returned
    /// handle is stopped or dropped. A tick that lands while a load is
    /// outstanding is skipped.
    pub fn start_auto_refresh(&self) -> RefreshHandle {
        let synchronizer = self.clone();
        let period = self.inner.config.refresh_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if synchronizer.inner.loads_in_flight.load(Ordering::SeqCst) > 0 {
                    debug!("favorites refresh already in flight, skipping tick");
                    continue;
                }
                // Failures are recorded in the snapshot by `load`.
                let _ = synchronizer.load().await;
            }
        });

        RefreshHandle { task }
    }
}

impl Inner {
    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<Symbol, PendingMutation>> {
        self.pending
            .lock()
            .expect("pending mutations lock is not poisoned")
    }

    /// Registers `token` as the latest mutation for `symbol`. `prior` is the
    /// symbol's state just before this mutation's optimistic change; it only
    /// becomes the baseline when no other mutation on the symbol is unsettled.
    fn begin_mutation(&self, symbol: &Symbol, token: u64, prior: Option<(usize, FavoriteEntry)>) {
        let mut pending = self.pending();
        let baseline = match pending.remove(symbol) {
            Some(superseded) => superseded.baseline,
            None => prior,
        };
        pending.insert(symbol.clone(), PendingMutation { token, baseline });
    }

    /// Applies a mutation's outcome.
    ///
    /// The latest mutation for `symbol` confirms its change or restores the
    /// shared baseline. A superseded mutation only moves the baseline to
    /// what the remote now holds. Errors are recorded either way.
    fn settle(&self, symbol: &Symbol, token: u64, settlement: Settlement) {
        self.state.send_modify(|state| {
            let mut pending = self.pending();
            let latest = pending.get(symbol).is_some_and(|m| m.token == token);
            let mutation = if latest { pending.remove(symbol) } else { None };

            match (mutation, settlement) {
                (Some(_), Settlement::Added(entry)) => {
                    state.entries.replace_or_insert_front(entry);
                    self.mirror(&state.entries);
                }
                (Some(_), Settlement::Removed) => self.mirror(&state.entries),
                (Some(mutation), Settlement::Failed(error)) => {
                    state.entries.remove(symbol);
                    if let Some((index, entry)) = mutation.baseline {
                        state.entries.restore(index, entry);
                    }
                    state.error = Some(error);
                }
                (None, settlement) => {
                    debug!(symbol = %symbol, "superseded favorite mutation settled");
                    let newer = pending.get_mut(symbol);
                    match (newer, settlement) {
                        (Some(newer), Settlement::Added(entry)) => {
                            let index = newer.baseline.as_ref().map_or(0, |(index, _)| *index);
                            newer.baseline = Some((index, entry));
                        }
                        (Some(newer), Settlement::Removed) => newer.baseline = None,
                        (_, Settlement::Failed(error)) => state.error = Some(error),
                        (None, _) => {}
                    }
                }
            }
        });
    }

    fn mirror(&self, entries: &FavoritesCollection) {
        let payload = match serde_json::to_string(entries) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "could not serialize favorites for local cache");
                return;
            }
        };
        if let Err(error) = self.local.write(&self.config.cache_key, &payload) {
            warn!(error = %error, "local favorites cache write failed");
        }
    }

    fn read_local(&self) -> Option<FavoritesCollection> {
        let payload = match self.local.read(&self.config.cache_key) {
            Ok(payload) => payload?,
            Err(error) => {
                warn!(error = %error, "local favorites cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&payload) {
            Ok(collection) => Some(collection),
            Err(error) => {
                warn!(error = %error, "local favorites cache holds unreadable data");
                None
            }
        }
    }
}

/// Keeps `loading` true while any load is outstanding, including loads
/// whose future is dropped mid-flight.
struct LoadingGuard<'a> {
    inner: &'a Inner,
}

impl<'a> LoadingGuard<'a> {
    fn enter(inner: &'a Inner) -> Self {
        inner.state.send_modify(|state| {
            inner.loads_in_flight.fetch_add(1, Ordering::SeqCst);
            state.loading = true;
        });
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let inner = self.inner;
        inner.state.send_modify(|state| {
            let remaining = inner.loads_in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            state.loading = remaining > 0;
        });
    }
}

/// Periodic refresh task. Dropping the handle stops it.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

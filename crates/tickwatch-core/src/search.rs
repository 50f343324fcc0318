//! Debounced symbol search.
//!
//! `search` is keystroke-level: every call cancels the pending request and
//! restarts the quiet-period timer, so only the last call in a burst reaches
//! the network. Results land in the debouncer's slot and are read with
//! [`SearchDebouncer::state`] or [`SearchDebouncer::subscribe`]; errors are
//! recorded there rather than returned.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::remote::{bounded, RemoteStockService};
use crate::state::{RequestState, Slot, Ticket};
use crate::{ClientError, ErrorKind, SearchResult};

struct Inner {
    remote: Arc<dyn RemoteStockService>,
    config: SearchConfig,
    slot: Slot<Vec<SearchResult>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct SearchDebouncer {
    inner: Arc<Inner>,
}

impl SearchDebouncer {
    pub fn new(remote: Arc<dyn RemoteStockService>, config: SearchConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                config,
                slot: Slot::new(),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Schedules a search for `keywords` after the quiet period.
    ///
    /// Queries shorter than the minimum clear the results immediately and
    /// never reach the network. Must be called from within a Tokio runtime.
    pub fn search(&self, keywords: &str) {
        let mut pending = self.inner.cancel_pending();
        let Some(query) = self.inner.accept(keywords) else {
            return;
        };

        let ticket = self.inner.slot.begin();
        let inner = Arc::clone(&self.inner);
        let quiet_period = inner.config.quiet_period;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let _ = inner.execute(ticket, &query).await;
        }));
    }

    /// Runs a search right away, skipping the quiet period, and returns its
    /// outcome as well as recording it.
    pub async fn query(&self, keywords: &str) -> Result<Vec<SearchResult>, ClientError> {
        let (query, ticket) = {
            let _pending = self.inner.cancel_pending();
            let Some(query) = self.inner.accept(keywords) else {
                return Ok(Vec::new());
            };
            (query, self.inner.slot.begin())
        };
        self.inner.execute(ticket, &query).await
    }

    /// Drops any scheduled or outstanding search and clears the results.
    pub fn cancel(&self) {
        let _pending = self.inner.cancel_pending();
        self.inner.slot.reset();
    }

    pub fn state(&self) -> RequestState<Vec<SearchResult>> {
        self.inner.slot.get()
    }

    /// Current ranked results; empty while idle, loading or failed.
    pub fn results(&self) -> Vec<SearchResult> {
        self.state().data().cloned().unwrap_or_default()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<Vec<SearchResult>>> {
        self.inner.slot.subscribe()
    }
}

impl Inner {
    /// Aborts the scheduled search, returning the lock so the caller can
    /// install a replacement atomically.
    fn cancel_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        let mut pending = self
            .pending
            .lock()
            .expect("pending search lock is not poisoned");
        if let Some(task) = pending.take() {
            task.abort();
        }
        pending
    }

    /// Trims `keywords`; resets the slot and returns `None` when too short.
    fn accept(&self, keywords: &str) -> Option<String> {
        let query = keywords.trim();
        if query.chars().count() < self.config.min_query_chars {
            self.slot.reset();
            return None;
        }
        Some(query.to_owned())
    }

    async fn execute(&self, ticket: Ticket, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        let flight = self.slot.in_flight(ticket);
        debug!(query, "searching symbols");

        let searched = bounded("symbol search", self.config.timeout, self.remote.search(query)).await;
        let outcome = match searched {
            Ok(results) => Ok(rank_results(query, results, self.config.max_results)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error),
        };

        let next = match &outcome {
            Ok(results) => RequestState::Loaded(results.clone()),
            Err(error) => {
                warn!(query, error = %error, "symbol search failed");
                RequestState::Failed(error.clone())
            }
        };
        if !flight.finish(next) {
            debug!(query, "discarding superseded search result");
        }
        outcome
    }
}

/// Drops incomplete results, orders by match quality and keeps the first
/// `max_results`.
///
/// Order: exact symbol, symbol prefix, symbol substring, name substring,
/// everything else; ties by symbol.
pub fn rank_results(query: &str, results: Vec<SearchResult>, max_results: usize) -> Vec<SearchResult> {
    let needle = query.trim().to_ascii_uppercase();
    let name_needle = query.trim().to_lowercase();

    let mut ranked: Vec<(u8, SearchResult)> = results
        .into_iter()
        .filter(SearchResult::is_complete)
        .map(|result| (match_rank(&needle, &name_needle, &result), result))
        .collect();

    ranked.sort_by(|(left_rank, left), (right_rank, right)| {
        left_rank
            .cmp(right_rank)
            .then_with(|| compare_symbols(&left.symbol, &right.symbol))
    });
    ranked.truncate(max_results);
    ranked.into_iter().map(|(_, result)| result).collect()
}

fn match_rank(needle: &str, name_needle: &str, result: &SearchResult) -> u8 {
    let symbol = result.symbol.trim().to_ascii_uppercase();
    if symbol == needle {
        0
    } else if symbol.starts_with(needle) {
        1
    } else if symbol.contains(needle) {
        2
    } else if result.name.to_lowercase().contains(name_needle) {
        3
    } else {
        4
    }
}

fn compare_symbols(left: &str, right: &str) -> Ordering {
    left.to_ascii_uppercase().cmp(&right.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(symbol: &str, name: &str) -> SearchResult {
        SearchResult {
            symbol: symbol.to_owned(),
            name: name.to_owned(),
            instrument_type: String::from("Equity"),
            region: String::from("United States"),
            currency: String::from("USD"),
        }
    }

    fn symbols(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[test]
    fn ranking_prefers_exact_then_prefix_then_substrings() {
        let ranked = rank_results(
            "app",
            vec![
                result("MAPP", "Mapp Holdings"),
                result("XYZ", "Applied Widgets"),
                result("APPN", "Appian Corp"),
                result("APP", "AppLovin"),
                result("APPF", "AppFolio"),
                result("QQQ", "Invesco QQQ"),
            ],
            15,
        );

        assert_eq!(symbols(&ranked), ["APP", "APPF", "APPN", "MAPP", "XYZ", "QQQ"]);
    }

    #[test]
    fn incomplete_results_are_dropped_and_list_is_capped() {
        let mut input = vec![result("", "Nameless"), result("ANON", "")];
        input.extend((0..20).map(|i| result(&format!("AA{i:02}"), "Filler")));

        let ranked = rank_results("AA", input, 15);

        assert_eq!(ranked.len(), 15);
        assert!(ranked.iter().all(SearchResult::is_complete));
        assert_eq!(ranked[0].symbol, "AA00");
    }
}

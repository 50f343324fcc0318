//! In-memory TTL cache for decoded remote responses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a single call interacts with the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh cached entry if present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, then overwrite the cached entry.
    Refresh,
}

impl CacheMode {
    pub const fn from_allow_cache(allow_cache: bool) -> Self {
        if allow_cache {
            Self::Use
        } else {
            Self::Refresh
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

/// Thread-safe response cache keyed by request identity.
///
/// A zero TTL disables the cache: nothing is stored and every lookup misses.
#[derive(Debug, Clone)]
pub struct ResponseCache<V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns a live entry when `mode` permits reading the cache.
    pub async fn lookup(&self, key: &str, mode: CacheMode) -> Option<V> {
        if mode == CacheMode::Refresh {
            return None;
        }
        let store = self.inner.read().await;
        store
            .map
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    /// Inserts `value` and drops every entry that has already expired.
    pub async fn store(&self, key: String, value: V) {
        let mut store = self.inner.write().await;
        if store.ttl.is_zero() {
            return;
        }
        let now = Instant::now();
        store.map.retain(|_, entry| entry.expires_at > now);
        let expires_at = now + store.ttl;
        store.map.insert(key, CacheEntry { value, expires_at });
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refresh_mode_skips_the_read_but_still_stores() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.store(String::from("series:AAPL:360"), 1_u32).await;

        assert_eq!(cache.lookup("series:AAPL:360", CacheMode::Use).await, Some(1));
        assert_eq!(cache.lookup("series:AAPL:360", CacheMode::Refresh).await, None);

        cache.store(String::from("series:AAPL:360"), 2).await;
        assert_eq!(cache.lookup("series:AAPL:360", CacheMode::Use).await, Some(2));
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = ResponseCache::new(Duration::from_millis(50));
        cache.store(String::from("k"), "v").await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(cache.lookup("k", CacheMode::Use).await, None);
    }

    #[tokio::test]
    async fn storing_purges_expired_entries() {
        let cache = ResponseCache::new(Duration::from_millis(50));
        cache.store(String::from("series:AAPL:360"), 1_u32).await;
        cache.store(String::from("series:MSFT:360"), 2).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.store(String::from("series:NVDA:360"), 3).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.lookup("series:NVDA:360", CacheMode::Use).await, Some(3));
    }

    #[tokio::test]
    async fn disabled_cache_stores_nothing() {
        let cache = ResponseCache::disabled();
        cache.store(String::from("k"), 7_u8).await;
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn allow_cache_maps_to_mode() {
        assert_eq!(CacheMode::from_allow_cache(true), CacheMode::Use);
        assert_eq!(CacheMode::from_allow_cache(false), CacheMode::Refresh);
    }
}

//! Client configuration and environment overrides.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TICKWATCH_API_URL` | `http://localhost:3000` |
//! | `TICKWATCH_CACHE_DIR` | `$HOME/.tickwatch` |
//! | `TICKWATCH_REFRESH_SECS` | `60` |
//! | `TICKWATCH_SERIES_TTL_SECS` | `300` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const FAVORITES_CACHE_KEY: &str = "favorites";

const API_URL_VAR: &str = "TICKWATCH_API_URL";
const CACHE_DIR_VAR: &str = "TICKWATCH_CACHE_DIR";
const REFRESH_SECS_VAR: &str = "TICKWATCH_REFRESH_SECS";
const SERIES_TTL_SECS_VAR: &str = "TICKWATCH_SERIES_TTL_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesConfig {
    /// Bound on list, add and remove calls.
    pub request_timeout: Duration,
    /// Bound on the lightweight existence check.
    pub check_timeout: Duration,
    pub refresh_interval: Duration,
    /// Key under which the collection is mirrored in the local cache.
    pub cache_key: String,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            check_timeout: Duration::from_secs(5),
            refresh_interval: Duration::from_secs(60),
            cache_key: String::from(FAVORITES_CACHE_KEY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockConfig {
    pub fetch_timeout: Duration,
    /// TTL of the HTTP service's series response cache. Zero disables it.
    pub series_ttl: Duration,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            series_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub quiet_period: Duration,
    pub timeout: Duration,
    /// Trimmed queries shorter than this never reach the network.
    pub min_query_chars: usize,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(300),
            timeout: Duration::from_secs(10),
            min_query_chars: 2,
            max_results: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub cache_dir: PathBuf,
    pub favorites: FavoritesConfig,
    pub stock: StockConfig,
    pub search: SearchConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::from(DEFAULT_API_URL),
            cache_dir: default_cache_dir(),
            favorites: FavoritesConfig::default(),
            stock: StockConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `TICKWATCH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(API_URL_VAR) {
            config.api_url = parse_api_url(API_URL_VAR, &url)?;
        }
        if let Some(dir) = lookup(CACHE_DIR_VAR) {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(REFRESH_SECS_VAR) {
            config.favorites.refresh_interval = parse_secs(REFRESH_SECS_VAR, &secs, false)?;
        }
        if let Some(secs) = lookup(SERIES_TTL_SECS_VAR) {
            config.stock.series_ttl = parse_secs(SERIES_TTL_SECS_VAR, &secs, true)?;
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }
}

fn parse_api_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_owned())
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: raw.to_owned(),
            reason: String::from("expected an http:// or https:// URL"),
        })
    }
}

fn parse_secs(name: &'static str, raw: &str, allow_zero: bool) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        name,
        value: raw.to_owned(),
        reason: reason.to_owned(),
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 && !allow_zero {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// `$HOME/.tickwatch`, or a directory under the system temp dir when no home
/// is set.
pub fn default_cache_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".tickwatch"),
        _ => env::temp_dir().join("tickwatch"),
    }
}

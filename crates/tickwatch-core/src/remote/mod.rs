//! Contracts for the network collaborators.
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`RemoteFavoritesService`] | `list`, `add`, `remove`, `contains` |
//! | [`RemoteStockService`] | `series`, `search` |
//!
//! Implementations report failures as [`RemoteError`]; the components that
//! consume them translate to [`ClientError`](crate::ClientError) before
//! anything reaches a caller. [`http`] holds the production implementations.

pub mod http;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::{ClientError, FavoriteEntry, NormalizedStockRecord, SearchResult, Symbol};

pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// Collaborator-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Connection refused, reset, DNS failure.
    Transport,
    Timeout,
    NotFound,
    /// Non-2xx answer other than 404.
    Rejected,
    /// 2xx answer whose body could not be decoded.
    Malformed,
}

/// Structured error reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    kind: RemoteErrorKind,
    status: Option<u16>,
    message: String,
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Transport,
            status: None,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Timeout,
            status: None,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::NotFound,
            status: Some(404),
            message: message.into(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Rejected,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Malformed,
            status: None,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> RemoteErrorKind {
        self.kind
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Price-history request forwarded to [`RemoteStockService::series`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: Symbol,
    pub range_days: u32,
    /// `false` asks the collaborator to skip any cached response.
    pub allow_cache: bool,
}

/// Durable favorites store behind the network boundary.
///
/// Symbols are matched case-insensitively on the far side; removing an absent
/// symbol reports [`RemoteErrorKind::NotFound`].
pub trait RemoteFavoritesService: Send + Sync {
    fn list(&self) -> RemoteFuture<'_, Vec<FavoriteEntry>>;

    fn add<'a>(
        &'a self,
        symbol: &'a Symbol,
        display_name: Option<&'a str>,
    ) -> RemoteFuture<'a, FavoriteEntry>;

    fn remove<'a>(&'a self, symbol: &'a Symbol) -> RemoteFuture<'a, ()>;

    /// Lightweight existence check.
    fn contains<'a>(&'a self, symbol: &'a Symbol) -> RemoteFuture<'a, bool>;
}

/// Market-data proxy behind the network boundary.
///
/// A symbol with no bars is a valid answer: the record comes back with an
/// empty series rather than as an error.
pub trait RemoteStockService: Send + Sync {
    fn series(&self, request: SeriesRequest) -> RemoteFuture<'_, NormalizedStockRecord>;

    fn search<'a>(&'a self, keywords: &'a str) -> RemoteFuture<'a, Vec<SearchResult>>;
}

/// Runs one remote call under `limit` and translates its outcome into a
/// [`ClientError`].
pub(crate) async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: RemoteFuture<'_, T>,
) -> Result<T, ClientError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(|error| ClientError::from_remote(error, operation, limit)),
        Err(_) => Err(ClientError::timeout(operation, limit)),
    }
}

use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;

use crate::remote::{RemoteError, RemoteErrorKind};
use crate::Symbol;

/// Validation and contract errors exposed by `tickwatch-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("range of {days} days is outside {min}..={max}")]
    InvalidRange { days: u32, min: u32, max: u32 },

    #[error("invalid ISO-8601 timestamp: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("date must be formatted YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("series contains more than one bar dated {date}")]
    DuplicateBarDate { date: String },
}

/// Caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Timeout,
    RemoteUnavailable,
    RemoteRejected,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::RemoteUnavailable => "remote_unavailable",
            Self::RemoteRejected => "remote_rejected",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every public operation of the synchronizer, the stock
/// cache and the search debouncer. Transport failures never escape unmapped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{resource} was not found")]
    NotFound { resource: String },

    /// The upstream answered, but the series for the symbol had no bars.
    #[error("no price data available for {symbol}")]
    EmptySeries { symbol: Symbol },

    #[error("{operation} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("remote service unavailable: {message}")]
    RemoteUnavailable { message: String },

    #[error("{message}")]
    RemoteRejected { status: Option<u16>, message: String },
}

impl ClientError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub const fn timeout(operation: &'static str, timeout: Duration) -> Self {
        Self::Timeout { operation, timeout }
    }

    /// Translates a collaborator error at the component boundary.
    ///
    /// `operation` and `timeout` describe the bounded call that produced the
    /// error so a transport-level timeout reports the same budget as an
    /// expired local deadline.
    pub fn from_remote(error: RemoteError, operation: &'static str, timeout: Duration) -> Self {
        match error.kind() {
            RemoteErrorKind::Timeout => Self::timeout(operation, timeout),
            RemoteErrorKind::Transport => Self::RemoteUnavailable {
                message: error.message().to_owned(),
            },
            RemoteErrorKind::NotFound => Self::not_found(error.message()),
            RemoteErrorKind::Rejected => Self::RemoteRejected {
                status: error.status(),
                message: error.message().to_owned(),
            },
            RemoteErrorKind::Malformed => Self::RemoteRejected {
                status: error.status(),
                message: format!("malformed response: {}", error.message()),
            },
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } | Self::EmptySeries { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            Self::RemoteRejected { .. } => ErrorKind::RemoteRejected,
        }
    }

    pub const fn retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout | ErrorKind::RemoteUnavailable
        )
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "client.validation",
            Self::NotFound { .. } => "client.not_found",
            Self::EmptySeries { .. } => "client.empty_series",
            Self::Timeout { .. } => "client.timeout",
            Self::RemoteUnavailable { .. } => "client.remote_unavailable",
            Self::RemoteRejected { .. } => "client.remote_rejected",
        }
    }
}

/// Failure of the persistent local cache. Logged by callers, never surfaced.
#[derive(Debug, Error)]
pub enum LocalCacheError {
    #[error("local cache i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("local cache unavailable: {0}")]
    Unavailable(String),
}

/// Invalid configuration value read from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

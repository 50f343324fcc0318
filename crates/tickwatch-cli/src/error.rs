use thiserror::Error;
use tickwatch_core::{ClientError, ConfigError, ErrorKind};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Client(error) => match error.kind() {
                ErrorKind::Validation => 2,
                ErrorKind::NotFound => 3,
                ErrorKind::Timeout => 4,
                ErrorKind::RemoteUnavailable | ErrorKind::RemoteRejected => 5,
            },
            Self::Config(_) => 2,
            Self::Serialization(_) => 6,
            Self::Io(_) => 10,
        }
    }

    /// `true` when retrying the same command may succeed.
    pub const fn retryable(&self) -> bool {
        match self {
            Self::Client(error) => error.retryable(),
            _ => false,
        }
    }
}

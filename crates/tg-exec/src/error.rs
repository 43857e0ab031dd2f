use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tg_protocol::ProtocolError;
use tg_store::StoreError;
use tg_types::TypeError;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The request payload could not be decoded.
    #[error("invalid input: {0}")]
    Input(#[from] ProtocolError),

    /// A thunk names an output tag that cannot form a cache key.
    #[error("invalid thunk: {0}")]
    InvalidThunk(#[from] TypeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to read bundled executables at {path}: {source}")]
    Executables {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to allocate scratch directory in {path}: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run executor {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("executor did not finish within {0:?}")]
    Timeout(Duration),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ExecError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) | Self::InvalidThunk(_) => "input_error",
            Self::Store(StoreError::Integrity(_)) => "integrity_error",
            Self::Store(_) | Self::Executables { .. } => "store_write_error",
            Self::Scratch { .. } => "scratch_error",
            Self::Spawn { .. } => "executor_spawn_error",
            Self::Timeout(_) => "executor_timeout",
            Self::Join(_) => "internal_error",
        }
    }

    /// `true` when the caller sent something the gateway cannot process.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Input(_) | Self::InvalidThunk(_))
    }
}

pub type ExecResult<T> = Result<T, ExecError>;

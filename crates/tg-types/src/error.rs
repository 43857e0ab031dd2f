use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("hash must not be empty")]
    EmptyHash,

    #[error("invalid hash {hash:?}: {reason}")]
    InvalidHash { hash: String, reason: &'static str },

    #[error("invalid output tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: &'static str },
}

pub type TypeResult<T> = Result<T, TypeError>;

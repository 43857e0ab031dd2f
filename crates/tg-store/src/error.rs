use std::path::PathBuf;

use tg_types::{ContentHash, TypeError};

/// Errors from blob store and reduction cache operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(ContentHash),

    /// A blob that must exist (a reduction cache hit points at it) is
    /// missing. The store and the cache disagree.
    #[error("integrity error: reduction result {0} has no blob in the store")]
    Integrity(ContentHash),

    /// Persisting a blob failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a blob, an entry, or a directory failed for a reason other
    /// than absence.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A reduction entry exists but does not name a usable hash.
    #[error("malformed reduction entry {key}: {reason}")]
    MalformedEntry { key: String, reason: String },

    #[error("invalid key: {0}")]
    InvalidKey(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

use tg_types::{ContentHash, ReductionKey};

use crate::error::{StoreError, StoreResult};

/// Read-only view of the reduction cache.
///
/// Entries map a (thunk hash, output tag) pair to the hash of the produced
/// output. The external executor is the only writer.
pub trait ReductionCache: Send + Sync {
    /// Resolve the output hash for `tag` of `thunk`.
    ///
    /// Returns `Ok(None)` on a miss. A miss is a normal outcome, not an
    /// error; `Err` is reserved for I/O failures and malformed entries.
    fn lookup(&self, thunk: &ContentHash, tag: &str) -> StoreResult<Option<ContentHash>>;
}

/// Extract the output hash from the raw content of a reduction entry.
///
/// The first whitespace-delimited token is the hash; the executor may append
/// further fields after it. An entry with no token is treated as a miss.
pub fn parse_entry(key: &ReductionKey, content: &str) -> StoreResult<Option<ContentHash>> {
    let Some(token) = content.split_whitespace().next() else {
        return Ok(None);
    };
    ContentHash::new(token)
        .map(Some)
        .map_err(|e| StoreError::MalformedEntry {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

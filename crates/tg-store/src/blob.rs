use tg_types::ContentHash;

use crate::error::StoreResult;

/// How a blob is materialized on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlobMode {
    #[default]
    Regular,
    /// Owner-executable; used for bundled executor binaries.
    Executable,
}

/// Size and permission bits of a stored blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobStat {
    pub size: u64,
    pub executable: bool,
}

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - The content at a hash is immutable. Two writes to one hash carry
///   byte-identical data, so a repeated write is a no-op for callers.
/// - A write is atomic: `get`/`stat` see either nothing or the whole blob.
/// - Concurrent reads are always safe.
pub trait BlobStore: Send + Sync {
    /// Store `data` under `hash` with the given mode.
    ///
    /// If a blob already exists under `hash` the write may be skipped; the
    /// existing blob (including its mode) is kept.
    fn put_with_mode(&self, hash: &ContentHash, data: &[u8], mode: BlobMode) -> StoreResult<()>;

    /// Read a blob. Fails with `StoreError::NotFound` if absent.
    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>>;

    /// Check whether a blob exists.
    fn exists(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// Size and executable flag of a blob that is expected to be present.
    ///
    /// Fails with `StoreError::Integrity` if the blob is missing: callers
    /// only stat hashes that a reduction entry vouched for.
    fn stat(&self, hash: &ContentHash) -> StoreResult<BlobStat>;

    /// Store a regular (non-executable) blob.
    fn put(&self, hash: &ContentHash, data: &[u8]) -> StoreResult<()> {
        self.put_with_mode(hash, data, BlobMode::Regular)
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use tg_types::{ContentHash, ReductionKey};

use crate::blob::{BlobMode, BlobStat, BlobStore};
use crate::error::{StoreError, StoreResult};
use crate::reduction::{parse_entry, ReductionCache};

#[derive(Clone, Debug)]
struct MemoryBlob {
    data: Vec<u8>,
    mode: BlobMode,
}

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` and
/// cloned on read.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<ContentHash, MemoryBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of all stored hashes.
    pub fn all_hashes(&self) -> Vec<ContentHash> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut hashes: Vec<ContentHash> = map.keys().cloned().collect();
        hashes.sort();
        hashes
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put_with_mode(&self, hash: &ContentHash, data: &[u8], mode: BlobMode) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        // First writer wins; identical content makes later writes redundant.
        map.entry(hash.clone()).or_insert_with(|| MemoryBlob {
            data: data.to_vec(),
            mode,
        });
        Ok(())
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(hash)
            .map(|blob| blob.data.clone())
            .ok_or_else(|| StoreError::NotFound(hash.clone()))
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(hash))
    }

    fn stat(&self, hash: &ContentHash) -> StoreResult<BlobStat> {
        let map = self.blobs.read().expect("lock poisoned");
        let blob = map
            .get(hash)
            .ok_or_else(|| StoreError::Integrity(hash.clone()))?;
        Ok(BlobStat {
            size: blob.data.len() as u64,
            executable: blob.mode == BlobMode::Executable,
        })
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}

/// In-memory reduction cache.
///
/// Stands in for the entries an executor would leave behind. Entries are
/// stored as raw content so lookups go through the same parsing as the
/// on-disk cache.
#[derive(Default)]
pub struct InMemoryReductionCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryReductionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `tag` of `thunk` reduced to `result`.
    pub fn insert(&self, thunk: &ContentHash, tag: &str, result: &ContentHash) -> StoreResult<()> {
        self.insert_raw(thunk, tag, result.as_str())
    }

    /// Record an entry with arbitrary content.
    pub fn insert_raw(&self, thunk: &ContentHash, tag: &str, content: &str) -> StoreResult<()> {
        let key = ReductionKey::new(thunk, tag)?;
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key.as_str().to_string(), content.to_string());
        Ok(())
    }
}

impl ReductionCache for InMemoryReductionCache {
    fn lookup(&self, thunk: &ContentHash, tag: &str) -> StoreResult<Option<ContentHash>> {
        let key = ReductionKey::new(thunk, tag)?;
        let map = self.entries.read().expect("lock poisoned");
        match map.get(key.as_str()) {
            Some(content) => parse_entry(&key, content),
            None => Ok(None),
        }
    }
}

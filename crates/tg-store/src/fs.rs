use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tg_types::{ContentHash, ReductionKey};
use tracing::debug;

use crate::blob::{BlobMode, BlobStat, BlobStore};
use crate::error::{StoreError, StoreResult};
use crate::layout::StoreLayout;
use crate::reduction::{parse_entry, ReductionCache};

/// Blob store backed by `<root>/blobs/<hash>` files.
///
/// Blobs are written to a temporary file inside the blob directory and
/// renamed into place, so concurrent writers of the same hash race only on
/// the rename and readers never see partial content.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    layout: StoreLayout,
}

impl FsBlobStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn write_atomic(&self, path: &Path, data: &[u8], mode: BlobMode) -> StoreResult<()> {
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut temp = NamedTempFile::new_in(self.layout.blobs_dir()).map_err(write_err)?;
        temp.write_all(data).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        set_mode(temp.path(), mode).map_err(write_err)?;
        temp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl BlobStore for FsBlobStore {
    fn put_with_mode(&self, hash: &ContentHash, data: &[u8], mode: BlobMode) -> StoreResult<()> {
        let path = self.layout.blob_path(hash);
        if self.exists(hash)? {
            debug!(%hash, "blob already present, skipping write");
            return Ok(());
        }
        self.write_atomic(&path, data, mode)?;
        debug!(%hash, size = data.len(), ?mode, "stored blob");
        Ok(())
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        let path = self.layout.blob_path(hash);
        fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StoreError::NotFound(hash.clone()),
            _ => StoreError::Read { path, source },
        })
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        let path = self.layout.blob_path(hash);
        path.try_exists()
            .map_err(|source| StoreError::Read { path, source })
    }

    fn stat(&self, hash: &ContentHash) -> StoreResult<BlobStat> {
        let path = self.layout.blob_path(hash);
        let meta = fs::metadata(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StoreError::Integrity(hash.clone()),
            _ => StoreError::Read { path, source },
        })?;
        Ok(BlobStat {
            size: meta.len(),
            executable: is_executable(&meta),
        })
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: BlobMode) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let bits = match mode {
        BlobMode::Regular => 0o644,
        BlobMode::Executable => 0o755,
    };
    fs::set_permissions(path, fs::Permissions::from_mode(bits))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: BlobMode) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    meta.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

/// Reduction cache backed by `<root>/reductions/<key>` files.
#[derive(Clone, Debug)]
pub struct FsReductionCache {
    layout: StoreLayout,
}

impl FsReductionCache {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }
}

impl ReductionCache for FsReductionCache {
    fn lookup(&self, thunk: &ContentHash, tag: &str) -> StoreResult<Option<ContentHash>> {
        let key = ReductionKey::new(thunk, tag)?;
        let path = self.layout.reduction_path(&key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%key, "reduction cache miss");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        let content = String::from_utf8(raw).map_err(|e| StoreError::MalformedEntry {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let hit = parse_entry(&key, &content)?;
        debug!(%key, result = ?hit, "reduction cache lookup");
        Ok(hit)
    }
}

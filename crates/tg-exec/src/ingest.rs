use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tg_protocol::ThunkPayload;
use tg_store::{BlobMode, BlobStore};
use tg_types::{ContentHash, ReductionKey, Thunk};
use tracing::{debug, warn};

use crate::error::{ExecError, ExecResult};

/// Materializes request thunks and bundled executables into the blob store.
#[derive(Clone)]
pub struct ThunkIngestor {
    store: Arc<dyn BlobStore>,
    executables_dir: Option<PathBuf>,
}

impl ThunkIngestor {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            executables_dir: None,
        }
    }

    /// Directory of executables shipped alongside the service. Each file
    /// name is the blob hash of its content.
    pub fn with_executables_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.executables_dir = Some(dir.into());
        self
    }

    /// Decode every payload, failing on the first bad one.
    ///
    /// Nothing is written here, so a rejected batch leaves the store as it
    /// was.
    pub fn decode(payloads: &[ThunkPayload]) -> ExecResult<Vec<Thunk>> {
        payloads
            .iter()
            .map(|payload| -> ExecResult<Thunk> {
                let thunk = payload.decode()?;
                for tag in &thunk.outputs {
                    ReductionKey::new(&thunk.hash, tag)?;
                }
                Ok(thunk)
            })
            .collect()
    }

    /// Decode the batch, store each thunk under its hash, then merge bundled
    /// executables.
    pub fn ingest(&self, payloads: &[ThunkPayload]) -> ExecResult<Vec<Thunk>> {
        let thunks = Self::decode(payloads)?;
        for thunk in &thunks {
            self.store.put(&thunk.hash, &thunk.data)?;
        }
        let merged = self.merge_executables()?;
        debug!(thunks = thunks.len(), executables = merged, "ingested batch");
        Ok(thunks)
    }

    /// Copy bundled executables that the store does not have yet.
    ///
    /// Blobs already present are never overwritten. Returns the number of
    /// executables copied. A missing directory means nothing is bundled.
    pub fn merge_executables(&self) -> ExecResult<usize> {
        let Some(dir) = &self.executables_dir else {
            return Ok(0);
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(bundle_err(dir, source)),
        };

        let mut merged = 0;
        for entry in entries {
            let entry = entry.map_err(|source| bundle_err(dir, source))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| bundle_err(&path, source))?;
            if file_type.is_dir() {
                continue;
            }
            let Some(hash) = entry
                .file_name()
                .to_str()
                .and_then(|name| ContentHash::new(name).ok())
            else {
                warn!(path = %path.display(), "skipping bundled file with unusable name");
                continue;
            };
            if self.store.exists(&hash)? {
                continue;
            }
            let data = fs::read(&path).map_err(|source| bundle_err(&path, source))?;
            self.store.put_with_mode(&hash, &data, BlobMode::Executable)?;
            debug!(%hash, "merged bundled executable");
            merged += 1;
        }
        Ok(merged)
    }
}

fn bundle_err(path: &Path, source: std::io::Error) -> ExecError {
    ExecError::Executables {
        path: path.to_path_buf(),
        source,
    }
}

impl std::fmt::Debug for ThunkIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThunkIngestor")
            .field("executables_dir", &self.executables_dir)
            .finish()
    }
}

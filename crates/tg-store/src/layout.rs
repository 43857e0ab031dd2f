use std::path::{Path, PathBuf};

use tg_types::{ContentHash, ReductionKey};

use crate::error::{StoreError, StoreResult};

const BLOBS_DIR: &str = "blobs";
const REDUCTIONS_DIR: &str = "reductions";

/// On-disk layout of a gateway store, shared with the executor process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
    blobs: PathBuf,
    reductions: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            blobs: root.join(BLOBS_DIR),
            reductions: root.join(REDUCTIONS_DIR),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blobs_dir(&self) -> &Path {
        &self.blobs
    }

    pub fn reductions_dir(&self) -> &Path {
        &self.reductions
    }

    pub fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.blobs.join(hash.as_str())
    }

    pub fn reduction_path(&self, key: &ReductionKey) -> PathBuf {
        self.reductions.join(key.as_str())
    }

    /// Create the blob and reduction directories if they do not exist.
    pub fn ensure(&self) -> StoreResult<()> {
        for dir in [&self.blobs, &self.reductions] {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Write {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

use std::path::Path;

use tempfile::TempDir;

use crate::error::{ExecError, ExecResult};

/// Name prefix of per-request scratch directories.
pub const SCRATCH_PREFIX: &str = "thunk-execute.";

/// Scratch directory owned by a single request.
///
/// The executor keeps its working state here. The directory is unique per
/// request and is removed when the guard drops, whichever way the request
/// ends, so concurrent requests never clean up each other's state.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn create_in(root: &Path) -> ExecResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)
            .map_err(|source| ExecError::Scratch {
                path: root.to_path_buf(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

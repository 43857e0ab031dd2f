use std::path::{Path, PathBuf};
use std::sync::Arc;

use tg_types::Thunk;
use tracing::{info, warn};

use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorOutput};
use crate::invocation::Invocation;
use crate::scratch::ScratchDir;

/// Runs the executor over a batch inside a fresh scratch directory.
#[derive(Clone)]
pub struct ExecutorBridge {
    executor: Arc<dyn Executor>,
    scratch_root: PathBuf,
}

impl ExecutorBridge {
    pub fn new(executor: Arc<dyn Executor>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            scratch_root: scratch_root.into(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Invoke the executor once for every thunk in `thunks`, in order.
    ///
    /// The scratch directory lives exactly as long as this call.
    pub async fn run_batch(
        &self,
        thunks: &[Thunk],
        timelog: bool,
        storage_backend: &str,
    ) -> ExecResult<ExecutorOutput> {
        let scratch = ScratchDir::create_in(&self.scratch_root)?;
        let invocation = Invocation::for_batch(thunks.iter().map(|t| &t.hash), timelog, storage_backend);
        info!(
            command = %invocation.command_line(),
            scratch = %scratch.path().display(),
            "invoking executor"
        );

        let output = self.executor.run(&invocation, scratch.path()).await?;
        if !output.success() {
            warn!(exit_code = output.exit_code, "executor exited with non-zero status");
        }
        Ok(output)
    }
}

impl std::fmt::Debug for ExecutorBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorBridge")
            .field("scratch_root", &self.scratch_root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::StubExecutor;
    use crate::scratch::SCRATCH_PREFIX;
    use tg_types::ContentHash;

    fn thunk(hash: &str) -> Thunk {
        Thunk::new(ContentHash::new(hash).unwrap(), vec![], vec![])
    }

    #[tokio::test]
    async fn forwards_batch_in_order() {
        let root = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubExecutor::new(ExecutorOutput::new(2, "out")));
        let bridge = ExecutorBridge::new(stub.clone(), root.path());

        let out = bridge
            .run_batch(&[thunk("T2"), thunk("T1")], true, "s3://b")
            .await
            .unwrap();

        assert_eq!(out, ExecutorOutput::new(2, "out"));
        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(&calls[0].args()[3..], ["--timelog", "T2", "T1"]);
        assert_eq!(calls[0].storage_backend(), "s3://b");
    }

    #[tokio::test]
    async fn scratch_is_released_after_run() {
        let root = tempfile::tempdir().unwrap();
        let bridge = ExecutorBridge::new(Arc::new(StubExecutor::succeeding()), root.path());
        bridge.run_batch(&[thunk("T1")], false, "").await.unwrap();

        let leftovers = std::fs::read_dir(root.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(SCRATCH_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
    }
}

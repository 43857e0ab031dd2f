use std::path::PathBuf;
use std::sync::Arc;

use tg_protocol::{ExecutionRequest, ExecutionResponse};
use tg_store::{BlobStore, ReductionCache};
use tracing::{info, warn};

use crate::assemble::{Assembly, ResultAssembler};
use crate::bridge::ExecutorBridge;
use crate::error::ExecResult;
use crate::executor::Executor;
use crate::ingest::ThunkIngestor;

/// One request's path through ingestion, execution, and assembly.
#[derive(Clone, Debug)]
pub struct Gateway {
    ingestor: ThunkIngestor,
    bridge: ExecutorBridge,
    assembler: ResultAssembler,
}

impl Gateway {
    pub fn new(ingestor: ThunkIngestor, bridge: ExecutorBridge, assembler: ResultAssembler) -> Self {
        Self {
            ingestor,
            bridge,
            assembler,
        }
    }

    /// Wire up a gateway over one store, cache, and executor.
    pub fn from_parts(
        store: Arc<dyn BlobStore>,
        cache: Arc<dyn ReductionCache>,
        executor: Arc<dyn Executor>,
        executables_dir: Option<PathBuf>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        let mut ingestor = ThunkIngestor::new(store.clone());
        if let Some(dir) = executables_dir {
            ingestor = ingestor.with_executables_dir(dir);
        }
        Self::new(
            ingestor,
            ExecutorBridge::new(executor, scratch_root),
            ResultAssembler::new(store, cache),
        )
    }

    /// Process a batch.
    ///
    /// `Err` covers rejected input and store, scratch, or executor launch
    /// failures. A non-zero executor exit and a partial result are both
    /// `Ok` responses.
    pub async fn execute(&self, request: ExecutionRequest) -> ExecResult<ExecutionResponse> {
        let ExecutionRequest {
            storage_backend,
            thunks,
            timelog,
        } = request;

        let ingestor = self.ingestor.clone();
        let thunks = tokio::task::spawn_blocking(move || ingestor.ingest(&thunks)).await??;
        info!(thunks = thunks.len(), timelog, "batch ingested");

        let output = self
            .bridge
            .run_batch(&thunks, timelog, &storage_backend)
            .await?;

        let assembler = self.assembler.clone();
        let assembly = tokio::task::spawn_blocking(move || assembler.assemble(&thunks)).await??;
        match &assembly {
            Assembly::Complete(executed) => {
                info!(thunks = executed.len(), "batch complete");
            }
            Assembly::Partial { missing } => {
                warn!(%missing, exit_code = output.exit_code, "no reduction entry, returning partial result");
            }
        }
        Ok(assembly.into_response(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::executor::{ExecutorOutput, StubExecutor};
    use serde_json::json;
    use tg_protocol::{encode_data, ThunkPayload};
    use tg_store::{InMemoryBlobStore, InMemoryReductionCache, StoreError};
    use tg_types::ContentHash;

    fn hash(s: &str) -> ContentHash {
        ContentHash::new(s).unwrap()
    }

    struct Harness {
        store: Arc<InMemoryBlobStore>,
        cache: Arc<InMemoryReductionCache>,
        _scratch: tempfile::TempDir,
        gateway: Gateway,
    }

    fn harness(executor: StubExecutor) -> Harness {
        harness_with(executor, |_, _| {})
    }

    fn harness_with(
        executor: StubExecutor,
        seed: impl FnOnce(&InMemoryBlobStore, &InMemoryReductionCache),
    ) -> Harness {
        let store = Arc::new(InMemoryBlobStore::new());
        let cache = Arc::new(InMemoryReductionCache::new());
        seed(&store, &cache);
        let scratch = tempfile::tempdir().unwrap();
        let gateway = Gateway::from_parts(
            store.clone(),
            cache.clone(),
            Arc::new(executor),
            None,
            scratch.path(),
        );
        Harness {
            store,
            cache,
            _scratch: scratch,
            gateway,
        }
    }

    fn request(thunks: Vec<ThunkPayload>) -> ExecutionRequest {
        ExecutionRequest {
            storage_backend: "s3://bucket".into(),
            thunks,
            timelog: false,
        }
    }

    fn payload(h: &str, outputs: &[&str]) -> ThunkPayload {
        ThunkPayload {
            data: "aGVsbG8=".into(),
            hash: hash(h),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn cached_output_yields_complete_result() {
        let h = harness_with(StubExecutor::succeeding(), |store, cache| {
            store.put(&hash("B1"), b"hello").unwrap();
            cache.insert(&hash("X1"), "out", &hash("B1")).unwrap();
        });

        let response = h.gateway.execute(request(vec![payload("X1", &["out"])])).await.unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "returnCode": 0,
                "stdout": "",
                "executedThunks": [{
                    "thunkHash": "X1",
                    "outputs": [{"tag": "out", "hash": "B1", "size": 5, "executable": false, "data": ""}]
                }]
            })
        );
        assert_eq!(h.store.get(&hash("X1")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn missing_entry_forwards_executor_status() {
        let h = harness(StubExecutor::new(ExecutorOutput::new(3, "partial\n")));

        let response = h.gateway.execute(request(vec![payload("X1", &["out"])])).await.unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"returnCode": 3, "stdout": "partial\n"})
        );
    }

    #[tokio::test]
    async fn complete_result_suppresses_executor_status() {
        let h = harness_with(StubExecutor::new(ExecutorOutput::new(1, "noise")), |store, cache| {
            store.put(&hash("B1"), b"x").unwrap();
            cache.insert(&hash("X1"), "out", &hash("B1")).unwrap();
        });
        let response = h.gateway.execute(request(vec![payload("X1", &["out"])])).await.unwrap();
        assert_eq!(response.return_code, 0);
        assert_eq!(response.stdout, "");
        assert!(response.is_complete());
    }

    #[tokio::test]
    async fn entries_written_by_executor_are_picked_up() {
        let store = Arc::new(InMemoryBlobStore::new());
        let cache = Arc::new(InMemoryReductionCache::new());
        let (effect_store, effect_cache) = (store.clone(), cache.clone());
        let executor = StubExecutor::succeeding().with_effect(move |inv| {
            let thunk = hash(inv.args().last().unwrap());
            effect_store.put(&hash("Tnext"), b"next-thunk").unwrap();
            effect_cache.insert(&thunk, "", &hash("Tnext")).unwrap();
        });
        let scratch = tempfile::tempdir().unwrap();
        let gateway = Gateway::from_parts(store, cache, Arc::new(executor), None, scratch.path());

        let response = gateway.execute(request(vec![payload("X1", &[""])])).await.unwrap();

        let executed = response.executed_thunks.unwrap();
        assert_eq!(executed[0].outputs[0].hash, hash("Tnext"));
        assert_eq!(executed[0].outputs[0].data, encode_data(b"next-thunk"));
    }

    #[tokio::test]
    async fn thunk_without_outputs_is_complete() {
        let h = harness(StubExecutor::new(ExecutorOutput::new(7, "boom")));
        let response = h.gateway.execute(request(vec![payload("H1", &[])])).await.unwrap();
        let executed = response.executed_thunks.unwrap();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].thunk_hash, hash("H1"));
        assert!(executed[0].outputs.is_empty());
    }

    #[tokio::test]
    async fn bad_payload_skips_executor() {
        let store = Arc::new(InMemoryBlobStore::new());
        let stub = Arc::new(StubExecutor::succeeding());
        let scratch = tempfile::tempdir().unwrap();
        let gateway = Gateway::from_parts(
            store.clone(),
            Arc::new(InMemoryReductionCache::new()),
            stub.clone(),
            None,
            scratch.path(),
        );
        let mut bad = payload("X2", &[]);
        bad.data = "***".into();

        let err = gateway
            .execute(request(vec![payload("X1", &[]), bad]))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::Input(_)));
        assert!(stub.calls().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn dangling_cache_entry_is_integrity_error() {
        let h = harness_with(StubExecutor::succeeding(), |_, cache| {
            cache.insert(&hash("X1"), "out", &hash("Bmissing")).unwrap();
        });
        let err = h
            .gateway
            .execute(request(vec![payload("X1", &["out"])]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Store(StoreError::Integrity(_))));
        assert_eq!(err.kind(), "integrity_error");
        assert!(h.cache.lookup(&hash("X1"), "out").unwrap().is_some());
    }
}

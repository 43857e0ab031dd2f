use std::sync::Arc;

use tg_protocol::{encode_data, ExecutedThunk, ExecutionResponse, ReturnOutput};
use tg_store::{BlobStore, ReductionCache, StoreError};
use tg_types::{ContentHash, ReductionKey, Thunk};

use crate::error::ExecResult;
use crate::executor::ExecutorOutput;

/// Terminal state of result assembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assembly {
    /// Every requested output resolved, in request order.
    Complete(Vec<ExecutedThunk>),
    /// Assembly stopped at the first output with no reduction entry.
    Partial { missing: ReductionKey },
}

impl Assembly {
    /// Build the response for this outcome.
    ///
    /// Executor status travels only with a partial result; a complete batch
    /// always reports code 0 and empty stdout.
    pub fn into_response(self, output: ExecutorOutput) -> ExecutionResponse {
        match self {
            Self::Complete(executed) => ExecutionResponse::complete(executed),
            Self::Partial { .. } => ExecutionResponse::partial(output.exit_code, output.stdout),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Collects produced outputs from the reduction cache and blob store.
#[derive(Clone)]
pub struct ResultAssembler {
    store: Arc<dyn BlobStore>,
    cache: Arc<dyn ReductionCache>,
}

impl ResultAssembler {
    pub fn new(store: Arc<dyn BlobStore>, cache: Arc<dyn ReductionCache>) -> Self {
        Self { store, cache }
    }

    /// Resolve every (thunk, tag) pair in request order.
    ///
    /// No reordering or deduplication: a thunk or tag requested twice
    /// appears twice.
    pub fn assemble(&self, thunks: &[Thunk]) -> ExecResult<Assembly> {
        let mut executed = Vec::with_capacity(thunks.len());
        for thunk in thunks {
            let mut outputs = Vec::with_capacity(thunk.outputs.len());
            for tag in &thunk.outputs {
                let Some(hash) = self.cache.lookup(&thunk.hash, tag)? else {
                    let missing = ReductionKey::new(&thunk.hash, tag)?;
                    return Ok(Assembly::Partial { missing });
                };
                outputs.push(self.resolve(tag, hash)?);
            }
            executed.push(ExecutedThunk {
                thunk_hash: thunk.hash.clone(),
                outputs,
            });
        }
        Ok(Assembly::Complete(executed))
    }

    fn resolve(&self, tag: &str, hash: ContentHash) -> ExecResult<ReturnOutput> {
        let stat = self.store.stat(&hash)?;
        let data = if hash.is_thunk() {
            let bytes = self.store.get(&hash).map_err(|e| match e {
                StoreError::NotFound(h) => StoreError::Integrity(h),
                other => other,
            })?;
            encode_data(&bytes)
        } else {
            String::new()
        };
        Ok(ReturnOutput {
            tag: tag.to_string(),
            hash,
            size: stat.size,
            executable: stat.executable,
            data,
        })
    }
}

impl std::fmt::Debug for ResultAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultAssembler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use tg_store::{BlobMode, InMemoryBlobStore, InMemoryReductionCache};

    fn hash(s: &str) -> ContentHash {
        ContentHash::new(s).unwrap()
    }

    fn thunk(h: &str, outputs: &[&str]) -> Thunk {
        Thunk::new(hash(h), vec![], outputs.iter().map(|s| s.to_string()).collect())
    }

    struct Fixture {
        store: Arc<InMemoryBlobStore>,
        cache: Arc<InMemoryReductionCache>,
        assembler: ResultAssembler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryBlobStore::new());
        let cache = Arc::new(InMemoryReductionCache::new());
        let assembler = ResultAssembler::new(store.clone(), cache.clone());
        Fixture { store, cache, assembler }
    }

    #[test]
    fn value_output_is_referenced_by_hash() {
        let f = fixture();
        f.store.put(&hash("B1"), b"hello").unwrap();
        f.cache.insert(&hash("X1"), "out", &hash("B1")).unwrap();

        let Assembly::Complete(executed) = f.assembler.assemble(&[thunk("X1", &["out"])]).unwrap() else {
            panic!("expected complete assembly");
        };
        assert_eq!(
            executed,
            vec![ExecutedThunk {
                thunk_hash: hash("X1"),
                outputs: vec![ReturnOutput {
                    tag: "out".into(),
                    hash: hash("B1"),
                    size: 5,
                    executable: false,
                    data: String::new(),
                }],
            }]
        );
    }

    #[test]
    fn thunk_output_is_inlined() {
        let f = fixture();
        f.store.put(&hash("Tnext"), b"thunk-bytes").unwrap();
        f.cache.insert(&hash("X1"), "", &hash("Tnext")).unwrap();

        let Assembly::Complete(executed) = f.assembler.assemble(&[thunk("X1", &[""])]).unwrap() else {
            panic!("expected complete assembly");
        };
        let out = &executed[0].outputs[0];
        assert_eq!(out.data, encode_data(b"thunk-bytes"));
        assert_eq!(out.size, 11);
    }

    #[test]
    fn executable_flag_comes_from_store() {
        let f = fixture();
        f.store
            .put_with_mode(&hash("Ebin"), b"\x7fELF", BlobMode::Executable)
            .unwrap();
        f.cache.insert(&hash("X1"), "bin", &hash("Ebin")).unwrap();

        let Assembly::Complete(executed) = f.assembler.assemble(&[thunk("X1", &["bin"])]).unwrap() else {
            panic!("expected complete assembly");
        };
        assert!(executed[0].outputs[0].executable);
    }

    #[test]
    fn first_miss_stops_assembly() {
        let f = fixture();
        f.store.put(&hash("B1"), b"a").unwrap();
        f.cache.insert(&hash("X1"), "a", &hash("B1")).unwrap();
        f.cache.insert(&hash("X2"), "c", &hash("B1")).unwrap();

        let assembly = f
            .assembler
            .assemble(&[thunk("X1", &["a", "b"]), thunk("X2", &["c"])])
            .unwrap();
        assert_eq!(
            assembly,
            Assembly::Partial {
                missing: ReductionKey::new(&hash("X1"), "b").unwrap()
            }
        );
    }

    #[test]
    fn no_outputs_never_partial() {
        let f = fixture();
        let assembly = f.assembler.assemble(&[thunk("H1", &[])]).unwrap();
        assert_eq!(
            assembly,
            Assembly::Complete(vec![ExecutedThunk {
                thunk_hash: hash("H1"),
                outputs: vec![],
            }])
        );
    }

    #[test]
    fn preserves_request_order_and_duplicates() {
        let f = fixture();
        for (tag, blob) in [("a", "Ba"), ("b", "Bb")] {
            f.store.put(&hash(blob), blob.as_bytes()).unwrap();
            f.cache.insert(&hash("X1"), tag, &hash(blob)).unwrap();
        }
        let Assembly::Complete(executed) = f
            .assembler
            .assemble(&[thunk("X1", &["b", "a", "b"]), thunk("X1", &["a"])])
            .unwrap()
        else {
            panic!("expected complete assembly");
        };
        let tags: Vec<_> = executed[0].outputs.iter().map(|o| o.tag.as_str()).collect();
        assert_eq!(tags, ["b", "a", "b"]);
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[1].outputs[0].hash, hash("Ba"));
    }

    #[test]
    fn hit_without_blob_is_integrity_error() {
        let f = fixture();
        f.cache.insert(&hash("X1"), "out", &hash("Bgone")).unwrap();
        let err = f.assembler.assemble(&[thunk("X1", &["out"])]).unwrap_err();
        assert!(matches!(err, ExecError::Store(StoreError::Integrity(h)) if h == hash("Bgone")));
    }

    #[test]
    fn response_shapes() {
        let out = ExecutorOutput::new(3, "partial\n");
        let partial = Assembly::Partial {
            missing: ReductionKey::new(&hash("X1"), "out").unwrap(),
        };
        assert_eq!(
            partial.into_response(out.clone()),
            ExecutionResponse::partial(3, "partial\n")
        );
        let complete = Assembly::Complete(vec![]).into_response(out);
        assert_eq!(complete.return_code, 0);
        assert_eq!(complete.stdout, "");
        assert!(complete.is_complete());
    }
}

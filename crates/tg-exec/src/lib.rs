//! Request pipeline of the thunk gateway.
//!
//! A batch moves through three strictly sequential stages:
//!
//! 1. [`ThunkIngestor`] decodes thunk payloads into the blob store and merges
//!    bundled executables.
//! 2. [`ExecutorBridge`] runs the external executor over the batch in a
//!    per-request scratch directory.
//! 3. [`ResultAssembler`] resolves every requested output through the
//!    reduction cache, stopping at the first miss.
//!
//! [`Gateway`] wires the stages together for one request.

pub mod assemble;
pub mod bridge;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod ingest;
pub mod invocation;
pub mod scratch;

pub use assemble::{Assembly, ResultAssembler};
pub use bridge::ExecutorBridge;
pub use error::{ExecError, ExecResult};
pub use executor::{vars, Executor, ExecutorOutput, ProcessExecutor, StubExecutor};
pub use gateway::Gateway;
pub use ingest::ThunkIngestor;
pub use invocation::{flags, Invocation};
pub use scratch::{ScratchDir, SCRATCH_PREFIX};

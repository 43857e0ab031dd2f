//! Content-addressed storage for the thunk gateway.
//!
//! Two stores live side by side under one base directory:
//!
//! - `blobs/<hash>` — immutable bytes keyed by content hash ([`BlobStore`])
//! - `reductions/<key>` — reduction cache entries written by the external
//!   executor and read back here ([`ReductionCache`])
//!
//! # Backends
//!
//! - [`FsBlobStore`] / [`FsReductionCache`] — the on-disk layout shared with
//!   the executor process
//! - [`InMemoryBlobStore`] / [`InMemoryReductionCache`] — `HashMap`-based
//!   stores for tests and embedding
//!
//! # Design Rules
//!
//! 1. A hash always maps to the same bytes. This is a caller contract; the
//!    store does not recompute hashes.
//! 2. Writes are atomic: readers never observe a partially written blob.
//! 3. The gateway never writes reduction entries.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod blob;
pub mod error;
pub mod fs;
pub mod layout;
pub mod memory;
pub mod reduction;

pub use blob::{BlobMode, BlobStat, BlobStore};
pub use error::{StoreError, StoreResult};
pub use fs::{FsBlobStore, FsReductionCache};
pub use layout::StoreLayout;
pub use memory::{InMemoryBlobStore, InMemoryReductionCache};
pub use reduction::{parse_entry, ReductionCache};

//! Foundation types for the thunk gateway.
//!
//! Every other gateway crate depends on `tg-types`. Hashes here are
//! caller-assigned names, not digests computed by the gateway: the build
//! framework that produced a thunk is the authority on its identity.
//!
//! # Key Types
//!
//! - [`ContentHash`] — validated content identifier, safe to use as a file name
//! - [`HashKind`] — thunk-typed vs. value-typed hash classification
//! - [`ReductionKey`] — reduction cache key (`hash` or `hash#tag`)
//! - [`Thunk`] — a decoded unit of deferred computation

pub mod error;
pub mod hash;
pub mod thunk;

pub use error::{TypeError, TypeResult};
pub use hash::{ContentHash, HashKind, ReductionKey, TAG_SEPARATOR, THUNK_MARKER};
pub use thunk::Thunk;

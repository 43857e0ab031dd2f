//! Wire protocol for the thunk gateway.
//!
//! Defines the JSON bodies exchanged with the execution engine that submits
//! thunk batches, the endpoint paths, and the base64 transfer encoding used
//! for inlined blob content.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;

pub use codec::{decode_data, encode_data, parse_request};
pub use endpoint::{endpoints, HealthResponse, PONG, PROTOCOL_VERSION};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    ErrorResponse, ExecutedThunk, ExecutionRequest, ExecutionResponse, ReturnOutput, ThunkPayload,
};

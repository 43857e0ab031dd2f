use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::ExecutionRequest;

/// Base64-encode blob content for inlining in a response.
pub fn encode_data(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode the base64 payload of the thunk named `hash`.
pub fn decode_data(hash: &str, data: &str) -> ProtocolResult<Vec<u8>> {
    STANDARD
        .decode(data)
        .map_err(|source| ProtocolError::InvalidBase64 {
            hash: hash.to_string(),
            source,
        })
}

/// Parse a raw request body.
pub fn parse_request(body: &[u8]) -> ProtocolResult<ExecutionRequest> {
    Ok(serde_json::from_slice(body)?)
}

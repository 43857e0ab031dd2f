use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid base64 data for thunk {hash}: {source}")]
    InvalidBase64 {
        hash: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("malformed request body: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

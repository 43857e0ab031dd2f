use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tg_exec::ExecError;
use tg_protocol::ErrorResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] tg_protocol::ProtocolError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("store error: {0}")]
    Store(#[from] tg_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Protocol(_) => StatusCode::BAD_REQUEST,
            Self::Exec(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Exec(ExecError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "input_error",
            Self::Exec(e) => e.kind(),
            Self::Store(tg_store::StoreError::Integrity(_)) => "integrity_error",
            Self::Store(_) => "store_write_error",
            Self::Config(_) => "config_error",
            Self::Io(_) | Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

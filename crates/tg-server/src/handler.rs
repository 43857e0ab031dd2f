use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use serde_json::json;
use tg_protocol::{parse_request, ExecutionResponse, HealthResponse, PONG};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::ServerResult;
use crate::router::AppState;

/// Run a thunk batch.
///
/// The body is parsed here rather than through the `Json` extractor so that
/// malformed input gets the same error body as any other rejected batch.
pub async fn execute_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ServerResult<Json<ExecutionResponse>> {
    let request_id = Uuid::now_v7();
    execute(state, body)
        .instrument(info_span!("execute", %request_id))
        .await
}

async fn execute(state: AppState, body: Bytes) -> ServerResult<Json<ExecutionResponse>> {
    info!(bytes = body.len(), "received a request");
    let request = parse_request(&body)?;
    match state.gateway().execute(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(error = %e, kind = e.kind(), "request failed");
            Err(e.into())
        }
    }
}

/// Liveness probe.
pub async fn ping_handler() -> &'static str {
    PONG
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "tg-server",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol_version": tg_protocol::PROTOCOL_VERSION,
    }))
}

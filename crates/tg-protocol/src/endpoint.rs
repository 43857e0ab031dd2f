pub const PROTOCOL_VERSION: u32 = 1;

/// Body of a successful liveness probe.
pub const PONG: &str = "pong";

/// HTTP endpoint paths.
pub mod endpoints {
    pub const EXECUTE: &str = "/";
    pub const PING: &str = "/ping";
    pub const HEALTH: &str = "/v1/health";
    pub const INFO: &str = "/v1/info";
}

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

//! HTTP front end for the thunk gateway.
//!
//! Accepts thunk batches on `POST /`, runs them through
//! [`tg_exec::Gateway`], and answers liveness probes on `GET /ping`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::GatewayConfig;
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::GatewayServer;

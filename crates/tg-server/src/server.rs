use std::sync::Arc;

use tg_exec::{Gateway, ProcessExecutor};
use tg_store::{FsBlobStore, FsReductionCache, StoreLayout};
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// Thunk gateway HTTP server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Prepare the on-disk store and wire the gateway to the executor
    /// process described by `config`.
    pub fn new(config: GatewayConfig) -> ServerResult<Self> {
        let layout = StoreLayout::new(&config.base_dir);
        layout.ensure()?;
        std::fs::create_dir_all(config.cache_dir())?;

        let mut executor =
            ProcessExecutor::new(&config.executor_path).with_timeout(config.executor_timeout());
        for (key, value) in config.executor_env()? {
            executor = executor.with_env(key, value);
        }

        let gateway = Gateway::from_parts(
            Arc::new(FsBlobStore::new(layout.clone())),
            Arc::new(FsReductionCache::new(layout)),
            Arc::new(executor),
            Some(config.executables_dir.clone()),
            &config.scratch_root,
        );
        Ok(Self::with_gateway(config, gateway))
    }

    /// Serve an already assembled gateway.
    pub fn with_gateway(config: GatewayConfig, gateway: Gateway) -> Self {
        Self {
            config,
            state: AppState::new(gateway),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.max_body_bytes)
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("thunk gateway listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down");
            })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tg_exec::vars;

use crate::error::{ServerError, ServerResult};

const EXECUTOR_BINARY: &str = "gg-execute-static";
const EXECUTABLES_DIR: &str = "executables";
const CACHE_SUBDIR: &str = "_cache";

/// Environment variables read at startup.
pub mod env_keys {
    pub const PORT: &str = "PORT";
    pub const STORE_DIR: &str = tg_exec::vars::STORE_DIR;
    pub const CACHE_DIR: &str = tg_exec::vars::CACHE_DIR;
}

/// Gateway configuration, built once at startup and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    /// Holds `blobs/` and `reductions/`.
    pub base_dir: PathBuf,
    /// Executor cache directory; `<base_dir>/_cache` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    pub executor_path: PathBuf,
    /// Executables bundled with the service, merged into the blob store.
    pub executables_dir: PathBuf,
    /// Parent of per-request scratch directories.
    pub scratch_root: PathBuf,
    pub executor_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let install_dir = install_dir();
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            base_dir: PathBuf::from("/tmp/_gg"),
            cache_dir: None,
            executor_path: install_dir.join(EXECUTOR_BINARY),
            executables_dir: install_dir.join(EXECUTABLES_DIR),
            scratch_root: std::env::temp_dir(),
            executor_timeout_secs: 900,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Directory containing the running binary; the executor and bundled
/// executables ship next to it.
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl GatewayConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Override fields from environment variables supplied by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ServerResult<()> {
        if let Some(port) = lookup(env_keys::PORT) {
            let port: u16 = port
                .parse()
                .map_err(|e| ServerError::Config(format!("invalid {}={port:?}: {e}", env_keys::PORT)))?;
            self.bind_addr.set_port(port);
        }
        if let Some(dir) = lookup(env_keys::STORE_DIR).filter(|d| !d.is_empty()) {
            self.base_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(env_keys::CACHE_DIR).filter(|d| !d.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join(CACHE_SUBDIR))
    }

    pub fn executor_timeout(&self) -> Duration {
        Duration::from_secs(self.executor_timeout_secs)
    }

    /// Environment for the executor child: store locations, plus a `PATH`
    /// that finds the tools shipped next to the executor first.
    pub fn executor_env(&self) -> ServerResult<Vec<(String, OsString)>> {
        let mut env = vec![
            (vars::STORE_DIR.to_string(), self.base_dir.clone().into_os_string()),
            (vars::CACHE_DIR.to_string(), self.cache_dir().into_os_string()),
        ];
        if let Some(tools) = self.executor_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let inherited = std::env::var_os("PATH").unwrap_or_default();
            let path = std::env::join_paths(
                std::iter::once(tools.to_path_buf()).chain(std::env::split_paths(&inherited)),
            )
            .map_err(|e| ServerError::Config(e.to_string()))?;
            env.push(("PATH".to_string(), path));
        }
        Ok(env)
    }
}

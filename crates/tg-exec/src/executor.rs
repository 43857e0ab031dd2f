use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ExecError, ExecResult};
use crate::invocation::Invocation;

/// Environment variables understood by the executor process.
pub mod vars {
    /// Base directory holding `blobs/` and `reductions/`.
    pub const STORE_DIR: &str = "GG_DIR";
    pub const CACHE_DIR: &str = "GG_CACHE_DIR";
    /// Storage backend URI from the request.
    pub const STORAGE_URI: &str = "GG_STORAGE_URI";
    /// Where the executor creates its per-run working directories.
    pub const TMPDIR: &str = "TMPDIR";
}

/// Exit status and captured standard output of one executor run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutorOutput {
    pub exit_code: i32,
    pub stdout: String,
}

impl ExecutorOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs the external executor.
///
/// A non-zero exit is reported through [`ExecutorOutput`], not as an error:
/// the executor may have reduced part of the batch. `Err` means the run
/// could not happen or did not finish.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(&self, invocation: &Invocation, scratch: &Path) -> ExecResult<ExecutorOutput>;
}

/// Executor backed by a child process.
///
/// The child gets its own environment: the configured variables plus the
/// request's storage backend and the scratch directory. The gateway's
/// process environment is never modified.
#[derive(Clone, Debug)]
pub struct ProcessExecutor {
    program: PathBuf,
    env: Vec<(String, OsString)>,
    timeout: Duration,
}

impl ProcessExecutor {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            env: Vec::new(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn run(&self, invocation: &Invocation, scratch: &Path) -> ExecResult<ExecutorOutput> {
        let spawn_err = |source| ExecError::Spawn {
            program: self.program.clone(),
            source,
        };

        let child = Command::new(&self.program)
            .args(invocation.args())
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .env(vars::STORAGE_URI, invocation.storage_backend())
            .env(vars::TMPDIR, scratch)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(spawn_err)?,
            Err(_) => return Err(ExecError::Timeout(self.timeout)),
        };

        if !output.stderr.is_empty() {
            debug!(stderr = %String::from_utf8_lossy(&output.stderr), "executor stderr");
        }

        Ok(ExecutorOutput {
            // Killed by a signal: no exit code.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

type Effect = Box<dyn Fn(&Invocation) + Send + Sync>;

/// Deterministic executor for tests and dry runs.
///
/// Returns a fixed output, records every invocation, and optionally runs a
/// side effect standing in for the blobs and reduction entries a real
/// executor would produce.
pub struct StubExecutor {
    output: ExecutorOutput,
    effect: Option<Effect>,
    calls: Mutex<Vec<Invocation>>,
}

impl StubExecutor {
    pub fn new(output: ExecutorOutput) -> Self {
        Self {
            output,
            effect: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Stub that exits 0 with no output.
    pub fn succeeding() -> Self {
        Self::new(ExecutorOutput::default())
    }

    pub fn with_effect(mut self, effect: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        self.effect = Some(Box::new(effect));
        self
    }

    /// Invocations seen so far, oldest first.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl Executor for StubExecutor {
    async fn run(&self, invocation: &Invocation, _scratch: &Path) -> ExecResult<ExecutorOutput> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push(invocation.clone());
        if let Some(effect) = &self.effect {
            effect(invocation);
        }
        Ok(self.output.clone())
    }
}

impl std::fmt::Debug for StubExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubExecutor")
            .field("output", &self.output)
            .finish()
    }
}

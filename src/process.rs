//! Running service control scripts.
//!
//! Each action is one child process, `<interpreter> <script> <action>`, and
//! the caller is blocked until that child has terminated. Services are never
//! run concurrently; the ordering between them is the only dependency
//! mechanism there is.

use crate::error::{Error, Result};
use crate::service::Action;
use crate::signal::ReapGate;
use async_trait::async_trait;
use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Exit status of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Process ID
    pub pid: u32,
    /// Exit code (if exited normally)
    pub code: Option<i32>,
    /// Signal (if killed by signal)
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Status of a process that exited normally.
    pub fn exited(pid: u32, code: i32) -> Self {
        Self {
            pid,
            code: Some(code),
            signal: None,
        }
    }

    /// Status of a process killed by a signal.
    pub fn signaled(pid: u32, signal: i32) -> Self {
        Self {
            pid,
            code: None,
            signal: Some(signal),
        }
    }

    /// Check if the process exited successfully.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn from_std(pid: u32, status: std::process::ExitStatus) -> Self {
        Self {
            pid,
            code: status.code(),
            signal: status.signal(),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exited with code {}", code),
            (None, Some(sig)) => write!(f, "killed by signal {}", sig),
            (None, None) => write!(f, "terminated with unknown status"),
        }
    }
}

/// Executes a single service action to completion.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    /// Run `action` on the script at `path`, returning once it has finished.
    ///
    /// `Ok` means the script exited normally with code 0; everything else,
    /// including failure to spawn, is an error.
    async fn run(&self, path: &Path, action: Action) -> Result<ExitStatus>;
}

/// Runs control scripts through a command interpreter.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    interpreter: PathBuf,
    gate: ReapGate,
}

impl ProcessRunner {
    /// Create a runner that invokes scripts through `interpreter`.
    pub fn new(interpreter: impl Into<PathBuf>, gate: ReapGate) -> Self {
        Self {
            interpreter: interpreter.into(),
            gate,
        }
    }

    /// The interpreter scripts are run with.
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }
}

#[async_trait]
impl ActionRunner for ProcessRunner {
    async fn run(&self, path: &Path, action: Action) -> Result<ExitStatus> {
        // Held until our child is collected so the SIGCHLD reaper leaves it alone.
        let _guard = self.gate.hold().await;

        let mut child = Command::new(&self.interpreter)
            .arg(path)
            .arg(action.as_str())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::ProcessSpawnFailed {
                path: path.to_path_buf(),
                reason: format!("{}: {}", self.interpreter.display(), e),
            })?;

        let pid = child.id().unwrap_or_default();
        debug!(service = %path.display(), action = %action, pid = pid, "Spawned control script");

        let status = ExitStatus::from_std(pid, child.wait().await?);
        debug!(service = %path.display(), action = %action, status = %status, "Control script finished");

        if status.success() {
            Ok(status)
        } else {
            Err(Error::ActionFailed {
                path: path.to_path_buf(),
                action,
                status,
            })
        }
    }
}

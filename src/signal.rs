//! Signal handling for the init process.
//!
//! Signals are translated into futures by tokio and handled on the control
//! thread. Two listeners are installed for the lifetime of the process:
//!
//! - SIGTERM / SIGINT set the shutdown flag. Nothing else happens there; the
//!   orchestrator notices the flag in its idle loop.
//! - SIGCHLD drains every exited child with a non-blocking `waitpid(-1)` so
//!   that no zombie outlives its parent's interest in it.
//!
//! The SIGCHLD reaper and [`ProcessRunner`](crate::process::ProcessRunner)
//! share a [`ReapGate`]. The runner holds the gate from spawn until it has
//! collected its own child, so the reaper can never steal that status.

use crate::error::{Error, Result};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::{Mutex, Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Default)]
struct ShutdownState {
    requested: AtomicBool,
    notify: Notify,
}

/// One-way `RUNNING -> SHUTDOWN_REQUESTED` flag, read by the orchestrator.
///
/// Writers only ever get a [`ShutdownHandle`].
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    inner: Arc<ShutdownState>,
}

impl ShutdownFlag {
    /// Create a flag in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capability to request shutdown.
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Suspend until shutdown has been requested.
    pub async fn wait(&self) {
        while !self.is_requested() {
            self.inner.notify.notified().await;
        }
    }
}

/// Write side of the [`ShutdownFlag`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownState>,
}

impl ShutdownHandle {
    /// Request shutdown.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// repeated requests are no-ops.
    pub fn request(&self) -> bool {
        if self.inner.requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.notify.notify_one();
        true
    }
}

/// Serializes the generic reaper against pid-scoped waits.
#[derive(Debug, Clone, Default)]
pub struct ReapGate {
    lock: Arc<Mutex<()>>,
}

impl ReapGate {
    /// Create a new gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the gate until the returned guard is dropped.
    pub async fn hold(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.lock).lock_owned().await
    }
}

/// Reap every exited child without blocking, returning how many were collected.
///
/// Callers must hold the [`ReapGate`].
pub fn reap_zombies() -> usize {
    let mut reaped = 0;

    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, code)) => {
                debug!(pid = pid.as_raw(), code = code, "Reaped zombie process");
                reaped += 1;
            }
            Ok(WaitStatus::Signaled(pid, sig, _)) => {
                debug!(pid = pid.as_raw(), signal = ?sig, "Reaped signaled process");
                reaped += 1;
            }
            Ok(WaitStatus::StillAlive) | Err(nix::Error::ECHILD) => break,
            Ok(_) => continue,
            Err(nix::Error::EINTR) => continue,
            Err(e) => {
                error!(error = %e, "Error reaping zombies");
                break;
            }
        }
    }

    reaped
}

/// Installed signal listeners. Dropping this uninstalls them.
pub struct SignalCoordinator {
    tasks: Vec<JoinHandle<()>>,
}

impl SignalCoordinator {
    /// Install the termination and child-reap listeners.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install(shutdown: ShutdownHandle, gate: ReapGate) -> Result<Self> {
        let sigterm = listen(SignalKind::terminate(), "SIGTERM")?;
        let sigint = listen(SignalKind::interrupt(), "SIGINT")?;
        let sigchld = listen(SignalKind::child(), "SIGCHLD")?;

        let terminate = tokio::spawn(watch_termination(sigterm, sigint, shutdown));
        let reap = tokio::spawn(watch_children(sigchld, gate));

        debug!("Signal handlers installed");
        Ok(Self {
            tasks: vec![terminate, reap],
        })
    }
}

impl Drop for SignalCoordinator {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn listen(kind: SignalKind, name: &str) -> Result<Signal> {
    signal(kind).map_err(|e| Error::SignalError(format!("{}: {}", name, e)))
}

async fn watch_termination(mut sigterm: Signal, mut sigint: Signal, shutdown: ShutdownHandle) {
    loop {
        let name = tokio::select! {
            Some(()) = sigterm.recv() => "SIGTERM",
            Some(()) = sigint.recv() => "SIGINT",
            else => break,
        };

        if shutdown.request() {
            info!(signal = name, "Received termination signal, initiating shutdown");
        } else {
            debug!(signal = name, "Shutdown already requested");
        }
    }
}

async fn watch_children(mut sigchld: Signal, gate: ReapGate) {
    while sigchld.recv().await.is_some() {
        let _guard = gate.hold().await;
        let reaped = reap_zombies();
        if reaped > 0 {
            debug!(reaped = reaped, "Drained exited children");
        }
    }
}

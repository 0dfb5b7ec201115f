//! Error types for the dendro init system.

use crate::process::ExitStatus;
use crate::service::Action;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for init system operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the init system.
///
/// None of these are fatal once orchestration has begun: the orchestrator
/// logs them and moves on to the next service.
#[derive(Error, Debug)]
pub enum Error {
    /// The control script could not be spawned
    #[error("Failed to spawn {path}: {reason}")]
    ProcessSpawnFailed { path: PathBuf, reason: String },

    /// The control script ran but did not exit cleanly
    #[error("Service {action} failed: {path}: {status}")]
    ActionFailed {
        path: PathBuf,
        action: Action,
        status: ExitStatus,
    },

    /// Signal handler installation error
    #[error("Signal error: {0}")]
    SignalError(String),

    /// Console device could not be bound to stdout/stderr
    #[error("Console error: {path}: {reason}")]
    ConsoleError { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Dendro init system - minimal PID 1 service orchestrator.
//!
//! Dendro discovers executable control scripts in a directory, starts them
//! in numeric order at boot and stops them in reverse order when asked to
//! shut down. It handles:
//!
//! - Service discovery from `<order>-<name>` file names
//! - Sequential `start` / `stop` execution through a command interpreter
//! - Signal handling (SIGTERM, SIGINT, SIGCHLD)
//! - Zombie process reaping
//! - Binding stdout/stderr to the console
//!
//! # Example
//!
//! ```no_run
//! use dendro::{Catalog, Orchestrator, ProcessRunner, ReapGate, ShutdownFlag, SignalCoordinator};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let gate = ReapGate::new();
//!     let shutdown = ShutdownFlag::new();
//!     let _signals = SignalCoordinator::install(shutdown.handle(), gate.clone())?;
//!
//!     let catalog = Catalog::scan(Path::new("/etc/dendro/init.d"));
//!     let runner = ProcessRunner::new("/bin/sh", gate);
//!     Orchestrator::new(catalog, runner, shutdown).run().await;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod console;
pub mod error;
pub mod init;
pub mod process;
pub mod service;
pub mod signal;

// Re-export main types
pub use catalog::{parse_service_name, Catalog, InvalidEntry, ParsedName};
pub use console::bind_console;
pub use error::{Error, Result};
pub use init::{InitConfig, Orchestrator};
pub use process::{ActionRunner, ExitStatus, ProcessRunner};
pub use service::{Action, ServiceRecord};
pub use signal::{reap_zombies, ReapGate, ShutdownFlag, ShutdownHandle, SignalCoordinator};

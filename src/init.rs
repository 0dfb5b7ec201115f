//! Init system core - boot, idle and teardown.

use crate::catalog::Catalog;
use crate::process::ActionRunner;
use crate::service::{Action, ServiceRecord};
use crate::signal::{ShutdownFlag, ShutdownHandle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};

/// Default directory containing service control scripts.
pub const DEFAULT_INIT_DIR: &str = "/etc/dendro/init.d";

/// Default interpreter used to run control scripts.
pub const DEFAULT_INTERPRETER: &str = "/bin/sh";

/// Default console device.
pub const DEFAULT_CONSOLE: &str = "/dev/console";

/// Init system configuration.
#[derive(Debug, Clone)]
pub struct InitConfig {
    /// Directory containing service control scripts
    pub init_dir: PathBuf,
    /// Interpreter used to run control scripts
    pub interpreter: PathBuf,
    /// Console device to bind stdout/stderr to, if any
    pub console: Option<PathBuf>,
    /// Whether to flush filesystems after teardown
    pub sync_on_exit: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            init_dir: PathBuf::from(DEFAULT_INIT_DIR),
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            console: Some(PathBuf::from(DEFAULT_CONSOLE)),
            sync_on_exit: true,
        }
    }
}

/// Drives the service lifecycle for one process lifetime.
pub struct Orchestrator<R> {
    catalog: Catalog,
    runner: R,
    shutdown: ShutdownFlag,
}

impl<R: ActionRunner> Orchestrator<R> {
    /// Create an orchestrator over a fixed catalog.
    ///
    /// The orchestrator takes ownership of the shutdown flag; whoever should
    /// be able to trip it keeps a [`ShutdownHandle`].
    pub fn new(catalog: Catalog, runner: R, shutdown: ShutdownFlag) -> Self {
        Self {
            catalog,
            runner,
            shutdown,
        }
    }

    /// Capability handed to the signal layer to request shutdown.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.handle()
    }

    /// The catalog being orchestrated.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Full lifecycle: boot, wait for shutdown, tear down.
    pub async fn run(&self) {
        self.boot().await;
        self.idle().await;
        self.teardown().await;
    }

    /// Start every service in ascending order. Failures do not stop the boot.
    pub async fn boot(&self) {
        info!(services = self.catalog.len(), "dendro is booting the system");

        for service in self.catalog.boot_order() {
            info!(service = %service, "starting {}", service);
            self.apply(service, Action::Start).await;
        }

        info!("Boot complete, waiting for shutdown");
    }

    /// Suspend until shutdown has been requested.
    pub async fn idle(&self) {
        self.shutdown.wait().await;
    }

    /// Stop every service in exact reverse boot order.
    pub async fn teardown(&self) {
        info!("dendro is shutting down the system");

        for service in self.catalog.teardown_order() {
            info!(service = %service, "stopping {}", service);
            self.apply(service, Action::Stop).await;
        }

        info!("all services stopped. exiting.");
        info!("dendro says goodbye!");
    }

    async fn apply(&self, service: &ServiceRecord, action: Action) {
        let started = Instant::now();
        let result = self.runner.run(service.path(), action).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(_) => {
                debug!(service = %service, action = %action, duration_ms = duration_ms, "Service action succeeded");
            }
            Err(e) => {
                error!(
                    service = %service,
                    action = %action,
                    duration_ms = duration_ms,
                    error = %e,
                    "failed to {} service: {}",
                    action,
                    service
                );
            }
        }
    }
}

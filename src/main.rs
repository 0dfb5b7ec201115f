//! Dendro init system binary.
//!
//! Runs as PID 1 by default, or inspects the service directory with `list`.

use clap::{Parser, Subcommand};
use dendro::init::{DEFAULT_CONSOLE, DEFAULT_INIT_DIR, DEFAULT_INTERPRETER};
use dendro::{
    bind_console, Catalog, InitConfig, Orchestrator, ProcessRunner, ReapGate, ShutdownFlag,
    SignalCoordinator,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dendro",
    about = "Dendro init system - minimal PID 1 service orchestrator",
    version,
    author
)]
struct Cli {
    /// Directory containing `<order>-<name>` control scripts
    #[arg(short, long, env = "DENDRO_INIT_DIR", default_value = DEFAULT_INIT_DIR)]
    init_dir: PathBuf,

    /// Interpreter used to run control scripts
    #[arg(long, env = "DENDRO_INTERPRETER", default_value = DEFAULT_INTERPRETER)]
    interpreter: PathBuf,

    /// Console device for stdout/stderr
    #[arg(long, env = "DENDRO_CONSOLE", default_value = DEFAULT_CONSOLE)]
    console: PathBuf,

    /// Keep the inherited stdout/stderr
    #[arg(long)]
    no_console: bool,

    /// Don't sync filesystems after teardown
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot services, wait for SIGTERM/SIGINT, then stop them (default)
    Run,

    /// Show the services that would be started, in boot order
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn config(&self) -> InitConfig {
        InitConfig {
            init_dir: self.init_dir.clone(),
            interpreter: self.interpreter.clone(),
            console: (!self.no_console).then(|| self.console.clone()),
            sync_on_exit: !self.no_sync,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        Some(Commands::Run) | None => run_init(config),
        Some(Commands::List { json }) => {
            init_logging();
            list_services(&config, json)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Run as the init system.
fn run_init(config: InitConfig) -> anyhow::Result<()> {
    // The console must be bound before the first log line is written.
    let console = config.console.as_deref().map(bind_console);
    init_logging();
    if let Some(Err(e)) = console {
        warn!(error = %e, "Continuing without console binding");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let gate = ReapGate::new();
        let shutdown = ShutdownFlag::new();
        let _signals = SignalCoordinator::install(shutdown.handle(), gate.clone())?;

        let catalog = Catalog::scan(&config.init_dir);
        let runner = ProcessRunner::new(&config.interpreter, gate);
        Orchestrator::new(catalog, runner, shutdown).run().await;

        anyhow::Ok(())
    })?;

    if config.sync_on_exit {
        info!("Syncing filesystems");
        nix::unistd::sync();
    }

    Ok(())
}

/// Print the catalog without running anything.
fn list_services(config: &InitConfig, json: bool) -> anyhow::Result<()> {
    let catalog = Catalog::scan(&config.init_dir);

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("No services found in {}", config.init_dir.display());
    } else {
        println!("Services (boot order):");
        for service in catalog.boot_order() {
            println!("  {:>5}  {}", service.order, service.path.display());
        }
    }

    if !catalog.invalid().is_empty() {
        println!("Invalid entries:");
        for entry in catalog.invalid() {
            println!("  {}: {}", entry.name, entry.reason);
        }
    }

    Ok(())
}

//! End-to-end boot and shutdown with real control scripts.
//!
//! This binary installs process-wide signal listeners, so it holds a single
//! test function.

use dendro::{Catalog, Orchestrator, ProcessRunner, ReapGate, ShutdownFlag, SignalCoordinator};
use nix::sys::signal::{raise, Signal};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Write a control script that logs `<name> <action>` and exits with `code`
/// when asked to start.
fn write_service(dir: &Path, name: &str, log: &Path, start_code: i32) {
    let body = format!(
        "echo \"{name} $1\" >> {log}\nif [ \"$1\" = start ]; then exit {start_code}; fi\nexit 0\n",
        name = name,
        log = log.display(),
        start_code = start_code,
    );
    fs::write(dir.join(name), body).unwrap();
}

fn read_log(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test(flavor = "current_thread")]
async fn test_boot_idle_teardown() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let init_dir = dir.path().join("init.d");
    fs::create_dir(&init_dir).unwrap();
    let log = dir.path().join("actions.log");

    write_service(&init_dir, "10-network", &log, 0);
    write_service(&init_dir, "05-logging", &log, 0);
    write_service(&init_dir, "20-app", &log, 0);
    write_service(&init_dir, "15-broken", &log, 1);
    write_service(&init_dir, "abc-bad", &log, 0);
    fs::write(init_dir.join("README"), "not a service\n").unwrap();

    let gate = ReapGate::new();
    let shutdown = ShutdownFlag::new();
    let _signals =
        SignalCoordinator::install(shutdown.handle(), gate.clone()).expect("install handlers");

    let catalog = Catalog::scan(&init_dir);
    assert_eq!(catalog.len(), 4);
    assert_eq!(catalog.invalid().len(), 1);
    assert_eq!(catalog.invalid()[0].name, "abc-bad");

    let orchestrator = Orchestrator::new(catalog, ProcessRunner::new("/bin/sh", gate), shutdown);

    // Deliver SIGTERM once every service has been started.
    let watched = log.clone();
    let signaller = tokio::spawn(async move {
        while read_log(&watched).len() < 4 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        raise(Signal::SIGTERM).expect("raise SIGTERM");
        raise(Signal::SIGTERM).expect("raise SIGTERM");
    });

    tokio::time::timeout(Duration::from_secs(30), orchestrator.run())
        .await
        .expect("orchestrator finishes after SIGTERM");
    signaller.await.unwrap();

    assert_eq!(
        read_log(&log),
        vec![
            "05-logging start",
            "10-network start",
            "15-broken start",
            "20-app start",
            "20-app stop",
            "15-broken stop",
            "10-network stop",
            "05-logging stop",
        ]
    );
}

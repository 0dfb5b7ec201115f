//! Tests for signal handling and zombie reaping.
//!
//! Signal dispositions are process-wide, so everything runs inside a single
//! test function.

use dendro::{
    reap_zombies, Action, ActionRunner, Error, ProcessRunner, ReapGate, ShutdownFlag,
    SignalCoordinator,
};
use nix::sys::signal::{raise, Signal};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn is_zombie_or_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

fn is_zombie(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| stat.rsplit(')').next().map(|rest| rest.trim_start().starts_with('Z')))
        .unwrap_or(false)
}

fn spawn_orphan() -> u32 {
    let child = std::process::Command::new("/bin/sh")
        .arg("-c")
        .arg("exit 0")
        .spawn()
        .expect("spawn orphan");
    child.id()
}

async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test(flavor = "current_thread")]
async fn test_signal_coordinator() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let gate = ReapGate::new();
    let shutdown = ShutdownFlag::new();

    // Before any listener exists, a manual drain reports what it collected.
    {
        let _guard = gate.hold().await;
        let pid = spawn_orphan();
        assert!(wait_until(|| is_zombie(pid)).await, "child {} never exited", pid);
        assert_eq!(reap_zombies(), 1);
        assert!(!is_zombie_or_alive(pid));
        assert_eq!(reap_zombies(), 0);
    }

    let _signals =
        SignalCoordinator::install(shutdown.handle(), gate.clone()).expect("install handlers");

    // The reaper must never collect a child the runner is waiting for.
    let runner = ProcessRunner::new("/bin/sh", gate.clone());
    let ok = script(&dir, "10-ok", "exit 0\n");
    let fail = script(&dir, "20-fail", "exit 3\n");
    for _ in 0..10 {
        let status = runner.run(&ok, Action::Start).await.expect("script succeeds");
        assert_eq!(status.code, Some(0));

        match runner.run(&fail, Action::Stop).await {
            Err(Error::ActionFailed { status, .. }) => assert_eq!(status.code, Some(3)),
            other => panic!("expected exit code 3, got {:?}", other),
        }
    }

    // Children nobody waits for are reaped instead of lingering as zombies.
    let pid = spawn_orphan();
    assert!(
        wait_until(|| !is_zombie_or_alive(pid)).await,
        "child {} was not reaped",
        pid
    );

    // Termination signals trip the flag exactly once.
    assert!(!shutdown.is_requested());
    raise(Signal::SIGTERM).expect("raise SIGTERM");
    tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
        .await
        .expect("SIGTERM requests shutdown");
    assert!(!shutdown.handle().request());

    raise(Signal::SIGINT).expect("raise SIGINT");
    raise(Signal::SIGTERM).expect("raise SIGTERM");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(shutdown.is_requested());
}

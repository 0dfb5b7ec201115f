//! Console binding.
//!
//! PID 1 starts with whatever descriptors the kernel handed it. Before the
//! first log line, stdout and stderr are pointed at the console device so
//! that boot and shutdown messages (ours and the control scripts') are seen.

use crate::error::{Error, Result};
use nix::unistd::dup2;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Rebind stdout and stderr to the console device at `path`.
pub fn bind_console(path: &Path) -> Result<()> {
    let console = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| Error::ConsoleError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let fd = console.as_raw_fd();
    for target in [io::stdout().as_raw_fd(), io::stderr().as_raw_fd()] {
        dup2(fd, target).map_err(|e| Error::ConsoleError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    // `console` closes on drop; stdout and stderr keep their duplicates.
    Ok(())
}

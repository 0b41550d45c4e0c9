//! Hand-off to the foreground server
//!
//! The bootstrapper replaces its own process image, so the server becomes
//! PID 1 and receives the orchestrator's signals directly.

use anyhow::{anyhow, Error};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

/// Arguments for the foreground server, followed by any passthrough arguments.
pub fn server_args(
    datadir: &Path,
    socket: &Path,
    system_user: &str,
    extra: &[String],
) -> Vec<String> {
    let mut args = vec![
        format!("--user={}", system_user),
        format!("--datadir={}", datadir.display()),
        format!("--socket={}", socket.display()),
    ];
    args.extend(extra.iter().cloned());
    args
}

/// Replace this process with `program`. Only returns on failure.
pub fn exec_server(program: &str, args: &[String]) -> Error {
    let err = Command::new(program).args(args).exec();
    anyhow!("Failed to exec {}: {}", program, err)
}

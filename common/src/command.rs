//! Command execution utilities
//!
//! Provides consistent command execution with proper error handling and logging.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Result of a command execution.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Turn a non-zero exit into an error carrying the command's stderr.
    pub fn checked(self, cmd: &str) -> Result<String> {
        if self.success {
            return Ok(self.stdout);
        }
        let code = self
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        Err(anyhow!("{} failed (exit {}): {}", cmd, code, self.stderr))
    }
}

/// Run a command and return its output.
///
/// This is a low-level function that returns both stdout and stderr.
/// Use `run_checked` if you want to treat non-zero exit as an error.
pub async fn run(cmd: &str, args: &[&str]) -> Result<CommandOutput> {
    run_with(cmd, args, &[], None).await
}

/// Run a command with extra environment variables and optional stdin input.
///
/// Environment values are never logged, so this is the place to hand
/// secrets to a child process.
#[instrument(skip_all, fields(cmd = %cmd))]
pub async fn run_with(
    cmd: &str,
    args: &[&str],
    envs: &[(&str, &str)],
    input: Option<&str>,
) -> Result<CommandOutput> {
    debug!(args = ?args, "Running command");
    let mut command = Command::new(cmd);
    command.args(args).envs(envs.iter().copied());
    output_of(command, cmd, input).await
}

/// Like `run_with`, but the child sees only `PATH` and `envs`.
///
/// Equivalent to `env -i PATH=$PATH`, so nothing the operator exported
/// (e.g. `MYSQL_PWD`) reaches the child unless passed explicitly.
#[instrument(skip_all, fields(cmd = %cmd))]
pub async fn run_isolated(
    cmd: &str,
    args: &[&str],
    envs: &[(&str, &str)],
    input: Option<&str>,
) -> Result<CommandOutput> {
    debug!(args = ?args, "Running command with a clean environment");
    let mut command = Command::new(cmd);
    command
        .args(args)
        .env_clear()
        .env("PATH", env::var("PATH").unwrap_or_default())
        .envs(envs.iter().copied());
    output_of(command, cmd, input).await
}

async fn output_of(
    mut command: Command,
    cmd: &str,
    input: Option<&str>,
) -> Result<CommandOutput> {
    let mut child = command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context(format!("Failed to execute {}", cmd))?;

    if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
        // A child that exits before reading (e.g. failed login) closes the
        // pipe; its exit status is what matters then
        if let Err(e) = stdin.write_all(input.as_bytes()).await {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(e).context(format!("Failed to write stdin of {}", cmd));
            }
        }
        // Dropping stdin closes the pipe so the child sees EOF
    }

    let output = child
        .wait_with_output()
        .await
        .context(format!("Failed to wait for {}", cmd))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        success: output.status.success(),
        code: output.status.code(),
    })
}

/// Run a command and return stdout if successful, error otherwise.
///
/// # Example
/// ```ignore
/// let version = run_checked("mariadbd", &["--version"]).await?;
/// ```
pub async fn run_checked(cmd: &str, args: &[&str]) -> Result<String> {
    run(cmd, args).await?.checked(cmd)
}

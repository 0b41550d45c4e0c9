//! The temporary background server used during bootstrap

use crate::datadir;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{info, warn};

const SERVER_BIN: &str = "mariadbd";

/// Grace period between SIGTERM and SIGKILL when aborting
const TERMINATE_GRACE: Duration = Duration::from_secs(10);

/// Lifecycle of the database engine while the bootstrap runs.
#[async_trait]
pub trait Engine: Send {
    /// Make the data and runtime directories usable. Returns `true` when
    /// the data directory had to be initialized.
    async fn prepare(&mut self) -> Result<bool>;

    /// Start the server in the background, local socket only.
    async fn start(&mut self) -> Result<()>;

    /// Exit status if the background server has already exited.
    fn exited(&mut self) -> Result<Option<ExitStatus>>;

    /// Wait for the background server to exit after a shutdown request.
    async fn wait_stopped(&mut self, limit: Duration) -> Result<()>;

    /// Stop the background server on abort: SIGTERM, then SIGKILL.
    async fn terminate(&mut self);
}

/// `mariadbd` running as a child of the bootstrapper
pub struct BackgroundServer {
    datadir: PathBuf,
    socket: PathBuf,
    system_user: String,
    child: Option<Child>,
}

impl BackgroundServer {
    pub fn new(
        datadir: impl Into<PathBuf>,
        socket: impl Into<PathBuf>,
        system_user: impl Into<String>,
    ) -> Self {
        Self {
            datadir: datadir.into(),
            socket: socket.into(),
            system_user: system_user.into(),
            child: None,
        }
    }

    fn server_args(&self) -> Vec<String> {
        vec![
            format!("--user={}", self.system_user),
            format!("--datadir={}", self.datadir.display()),
            format!("--socket={}", self.socket.display()),
            "--skip-networking".to_string(),
        ]
    }
}

#[async_trait]
impl Engine for BackgroundServer {
    async fn prepare(&mut self) -> Result<bool> {
        datadir::ensure_socket_dir(&self.socket, &self.system_user)?;
        datadir::ensure_datadir(&self.datadir, &self.system_user).await?;

        if datadir::is_initialized(&self.datadir) {
            return Ok(false);
        }

        info!(datadir = %self.datadir.display(), "Data directory is empty, initializing");
        datadir::install_system_tables(&self.datadir, &self.system_user).await?;
        Ok(true)
    }

    async fn start(&mut self) -> Result<()> {
        let child = Command::new(SERVER_BIN)
            .args(self.server_args())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context(format!("Failed to start {}", SERVER_BIN))?;

        info!(pid = child.id(), "Background server started");
        self.child = Some(child);
        Ok(())
    }

    fn exited(&mut self) -> Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child
                .try_wait()
                .context("Failed to poll background server"),
            None => Err(anyhow!("background server was never started")),
        }
    }

    async fn wait_stopped(&mut self, limit: Duration) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        let status = timeout(limit, child.wait())
            .await
            .map_err(|_| anyhow!("server still running {}s after shutdown", limit.as_secs()))?
            .context("Failed to wait for background server")?;

        info!(status = %status, "Background server stopped");
        self.child = None;
        Ok(())
    }

    async fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let Some(pid) = child.id() else {
            return;
        };

        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        if timeout(TERMINATE_GRACE, child.wait()).await.is_err() {
            warn!(pid, "Background server ignored SIGTERM, killing");
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
            let _ = child.wait().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_server_is_socket_only() {
        let server = BackgroundServer::new("/var/lib/mysql", "/run/mysqld/mysqld.sock", "mysql");
        let args = server.server_args();
        assert!(args.contains(&"--skip-networking".to_string()));
        assert!(args.contains(&"--user=mysql".to_string()));
        assert!(args.contains(&"--socket=/run/mysqld/mysqld.sock".to_string()));
    }

    #[test]
    fn test_exited_before_start_is_error() {
        let mut server = BackgroundServer::new("/tmp/d", "/tmp/s.sock", "mysql");
        assert!(server.exited().is_err());
    }

    #[tokio::test]
    async fn test_wait_stopped_without_child_is_noop() {
        let mut server = BackgroundServer::new("/tmp/d", "/tmp/s.sock", "mysql");
        server.wait_stopped(Duration::from_secs(1)).await.unwrap();
        server.terminate().await;
    }

    #[tokio::test]
    async fn test_terminate_reaps_running_child() {
        let mut server = BackgroundServer::new("/tmp/d", "/tmp/s.sock", "mysql");
        let child = Command::new("sleep").arg("60").spawn().unwrap();
        let pid = Pid::from_raw(child.id().unwrap() as i32);
        server.child = Some(child);
        assert!(server.exited().unwrap().is_none());

        timeout(Duration::from_secs(5), server.terminate())
            .await
            .unwrap();

        assert!(server.child.is_none());
        // Reaped, so the pid no longer exists
        assert_eq!(kill(pid, None), Err(nix::errno::Errno::ESRCH));
    }
}

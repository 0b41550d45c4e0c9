//! Administrative access to the local server
//!
//! All calls go over the local control socket through the `mariadb` and
//! `mariadb-admin` command-line clients.

use anyhow::Result;
use async_trait::async_trait;
use crate::bootstrap::sql::{NOOP_QUERY, SESSION_SETUP};
use common::run_isolated;
use std::path::PathBuf;

const CLIENT_BIN: &str = "mariadb";
const ADMIN_BIN: &str = "mariadb-admin";

/// How root authenticates for an administrative call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// No password; the server trusts the local OS identity
    Socket,
    /// Root with the configured password
    Password,
}

/// Administrative operations the bootstrap needs from the server.
#[async_trait]
pub trait Admin: Send + Sync {
    /// Liveness check. `Ok(false)` means the server is not answering yet.
    async fn ping(&self, auth: AuthMode) -> Result<bool>;

    /// Whether a no-op query succeeds with the given authentication.
    async fn authenticates(&self, auth: AuthMode) -> Result<bool>;

    /// Execute one SQL statement. Any server error is returned as `Err`.
    async fn execute(&self, auth: AuthMode, sql: &str) -> Result<()>;

    /// Ask the server to shut down gracefully.
    async fn shutdown(&self, auth: AuthMode) -> Result<()>;
}

/// `Admin` backed by the MariaDB command-line clients
pub struct CliAdmin {
    socket: PathBuf,
    root_password: String,
}

impl CliAdmin {
    pub fn new(socket: impl Into<PathBuf>, root_password: impl Into<String>) -> Self {
        Self {
            socket: socket.into(),
            root_password: root_password.into(),
        }
    }

    /// Connection arguments. `--no-defaults` must come first and keeps
    /// option files from injecting credentials.
    fn connection_args(&self) -> Vec<String> {
        vec![
            "--no-defaults".to_string(),
            "--protocol=socket".to_string(),
            format!("--socket={}", self.socket.display()),
            "--user=root".to_string(),
        ]
    }

    /// The password reaches the client through `MYSQL_PWD`, never argv.
    /// Clients run with a clean environment, so socket mode sends none.
    fn env(&self, auth: AuthMode) -> Vec<(&str, &str)> {
        match auth {
            AuthMode::Socket => vec![],
            AuthMode::Password => vec![("MYSQL_PWD", self.root_password.as_str())],
        }
    }

    fn args_with<'a>(base: &'a [String], extra: &[&'a str]) -> Vec<&'a str> {
        base.iter()
            .map(String::as_str)
            .chain(extra.iter().copied())
            .collect()
    }
}

/// One client session: reset `sql_mode`, then the statement.
fn script(sql: &str) -> String {
    format!("{};\n{};\n", SESSION_SETUP, sql)
}

#[async_trait]
impl Admin for CliAdmin {
    async fn ping(&self, auth: AuthMode) -> Result<bool> {
        let base = self.connection_args();
        let args = Self::args_with(&base, &["--connect-timeout=2", "--silent", "ping"]);
        let output = run_isolated(ADMIN_BIN, &args, &self.env(auth), None).await?;
        Ok(output.success)
    }

    async fn authenticates(&self, auth: AuthMode) -> Result<bool> {
        let base = self.connection_args();
        let args = Self::args_with(&base, &["--batch", "--skip-column-names"]);
        let input = format!("{};\n", NOOP_QUERY);
        let output = run_isolated(CLIENT_BIN, &args, &self.env(auth), Some(&input)).await?;
        Ok(output.success)
    }

    async fn execute(&self, auth: AuthMode, sql: &str) -> Result<()> {
        let base = self.connection_args();
        let args = Self::args_with(&base, &["--batch", "--skip-column-names"]);
        // SQL goes over stdin so credentials in it never show up in `ps`
        run_isolated(CLIENT_BIN, &args, &self.env(auth), Some(&script(sql)))
            .await?
            .checked(CLIENT_BIN)?;
        Ok(())
    }

    async fn shutdown(&self, auth: AuthMode) -> Result<()> {
        let base = self.connection_args();
        let args = Self::args_with(&base, &["shutdown"]);
        run_isolated(ADMIN_BIN, &args, &self.env(auth), None)
            .await?
            .checked(ADMIN_BIN)?;
        Ok(())
    }
}

//! Bootstrap configuration from environment variables
//!
//! Everything is read and validated once at startup. The sequence only ever
//! sees a `BootstrapConfig`, never the environment.

use crate::paths::{DEFAULT_DATADIR, DEFAULT_SOCKET};
use common::ConfigExt;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DATABASE_VAR: &str = "MYSQL_DATABASE";
pub const USER_VAR: &str = "MYSQL_USER";
pub const PASSWORD_VAR: &str = "MYSQL_PASSWORD";
pub const ROOT_PASSWORD_VAR: &str = "MYSQL_ROOT_PASSWORD";

/// MariaDB identifier limits
const MAX_DATABASE_LEN: usize = 64;
const MAX_USER_LEN: usize = 80;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} (or {name}_FILE) must be set")]
    Missing { name: &'static str },

    #[error("{name} must not be empty")]
    Empty { name: &'static str },

    #[error("{name} is {len} characters long, the limit is {max}")]
    TooLong {
        name: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{name} must not contain NUL bytes")]
    NulByte { name: &'static str },

    #[error("failed to load {name}: {source}")]
    Unreadable {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// The four values the bootstrap provisions
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub database: String,
    pub user: String,
    pub password: String,
    pub root_password: String,
}

impl Credentials {
    /// Validate and build credentials.
    pub fn new(
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        root_password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let creds = Self {
            database: database.into(),
            user: user.into(),
            password: password.into(),
            root_password: root_password.into(),
        };

        check(DATABASE_VAR, &creds.database, Some(MAX_DATABASE_LEN))?;
        check(USER_VAR, &creds.user, Some(MAX_USER_LEN))?;
        check(PASSWORD_VAR, &creds.password, None)?;
        check(ROOT_PASSWORD_VAR, &creds.root_password, None)?;

        Ok(creds)
    }

    fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            secret(DATABASE_VAR)?,
            secret(USER_VAR)?,
            secret(PASSWORD_VAR)?,
            secret(ROOT_PASSWORD_VAR)?,
        )
    }
}

// Keep passwords out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("root_password", &"<redacted>")
            .finish()
    }
}

fn secret(name: &'static str) -> Result<String, ConfigError> {
    String::env_secret(name)
        .map_err(|source| ConfigError::Unreadable { name, source })?
        .ok_or(ConfigError::Missing { name })
}

fn check(name: &'static str, value: &str, max: Option<usize>) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Empty { name });
    }
    if value.contains('\0') {
        return Err(ConfigError::NulByte { name });
    }
    if let Some(max) = max {
        let len = value.chars().count();
        if len > max {
            return Err(ConfigError::TooLong { name, len, max });
        }
    }
    Ok(())
}

/// Configuration for the bootstrap sequence
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub credentials: Credentials,
    pub datadir: PathBuf,
    pub socket: PathBuf,
    /// OS user that owns the runtime directories and runs the server
    pub system_user: String,
    pub ready_interval: Duration,
    /// `None` waits for readiness forever
    pub ready_timeout: Option<Duration>,
    /// How long to wait for the background server to exit after shutdown
    pub shutdown_timeout: Duration,
    /// Foreground server program that replaces this process
    pub server_command: String,
}

impl BootstrapConfig {
    /// Build a configuration with default paths and timings.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            datadir: PathBuf::from(DEFAULT_DATADIR),
            socket: PathBuf::from(DEFAULT_SOCKET),
            system_user: "mysql".to_string(),
            ready_interval: Duration::from_secs(1),
            ready_timeout: Some(Duration::from_secs(120)),
            shutdown_timeout: Duration::from_secs(30),
            server_command: "mysqld_safe".to_string(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let credentials = Credentials::from_env()?;

        Ok(Self {
            credentials,
            datadir: PathBuf::from(String::env_or("MARIADB_DATADIR", DEFAULT_DATADIR)),
            socket: PathBuf::from(String::env_or("MARIADB_SOCKET", DEFAULT_SOCKET)),
            system_user: String::env_or("MARIADB_SYSTEM_USER", "mysql"),
            ready_interval: ready_interval(u64::env_parse("MARIADB_READY_INTERVAL", 1)),
            ready_timeout: ready_timeout(u64::env_parse("MARIADB_READY_TIMEOUT", 120)),
            shutdown_timeout: Duration::from_secs(u64::env_parse("MARIADB_SHUTDOWN_TIMEOUT", 30)),
            server_command: String::env_or("MARIADB_SERVER_COMMAND", "mysqld_safe"),
        })
    }
}

/// Never poll faster than once a second
fn ready_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

/// 0 disables the readiness bound
fn ready_timeout(secs: u64) -> Option<Duration> {
    match secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

//! Data and runtime directory preparation
//!
//! The container starts as root; the server runs as the system user, which
//! must own the socket directory and the data directory.

use crate::paths::{socket_dir, system_schema_dir};
use anyhow::{anyhow, Context, Result};
use common::run_checked;
use nix::unistd::{chown, User};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

/// Recursive ownership fixes on large volumes can be slow
const CHOWN_TIMEOUT: Duration = Duration::from_secs(120);

fn lookup_user(name: &str) -> Result<User> {
    User::from_name(name)
        .context(format!("Failed to look up user {}", name))?
        .ok_or_else(|| anyhow!("system user {} does not exist", name))
}

/// Create the socket directory and hand it to the system user.
pub fn ensure_socket_dir(socket: &Path, system_user: &str) -> Result<()> {
    let dir = socket_dir(socket);
    let user = lookup_user(system_user)?;

    fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;
    chown(dir, Some(user.uid), Some(user.gid))
        .context(format!("Failed to chown {}", dir.display()))?;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755))
        .context(format!("Failed to set permissions on {}", dir.display()))?;

    Ok(())
}

/// Create the data directory if needed and make the system user own it.
pub async fn ensure_datadir(datadir: &Path, system_user: &str) -> Result<()> {
    if !datadir.exists() {
        info!(datadir = %datadir.display(), "Creating data directory");
        fs::create_dir_all(datadir)
            .context(format!("Failed to create {}", datadir.display()))?;
    }

    // `user:` selects the user's login group
    let owner = format!("{}:", system_user);
    let path = datadir.display().to_string();
    timeout(CHOWN_TIMEOUT, run_checked("chown", &["-R", &owner, &path]))
        .await
        .map_err(|_| anyhow!("chown timed out after {}s", CHOWN_TIMEOUT.as_secs()))??;

    Ok(())
}

/// Whether the data directory holds the system schema.
pub fn is_initialized(datadir: &Path) -> bool {
    system_schema_dir(datadir).is_dir()
}

/// Create the system tables in an empty data directory.
///
/// Root is left with socket authentication only.
pub async fn install_system_tables(datadir: &Path, system_user: &str) -> Result<()> {
    let user_arg = format!("--user={}", system_user);
    let datadir_arg = format!("--datadir={}", datadir.display());
    run_checked("mariadb-install-db", &[&user_arg, &datadir_arg])
        .await
        .context("Failed to initialize data directory")?;
    Ok(())
}

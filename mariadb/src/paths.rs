//! Path utilities for the MariaDB data and runtime directories
//!
//! Provides consistent path resolution for the data directory, the control
//! socket and the files the bootstrapper keeps inside the data directory.

use std::path::{Path, PathBuf};

/// Default data directory (the persistent volume mount)
pub const DEFAULT_DATADIR: &str = "/var/lib/mysql";

/// Default local control socket
pub const DEFAULT_SOCKET: &str = "/run/mysqld/mysqld.sock";

/// Name of the completion marker written after a successful bootstrap
pub const BOOTSTRAP_MARKER: &str = ".bootstrap_complete";

/// The `mysql` system schema directory; its absence means an uninitialized datadir
pub fn system_schema_dir(datadir: &Path) -> PathBuf {
    datadir.join("mysql")
}

/// Path to the bootstrap completion marker
pub fn bootstrap_marker(datadir: &Path) -> PathBuf {
    datadir.join(BOOTSTRAP_MARKER)
}

/// Directory holding the control socket (and the pid file)
pub fn socket_dir(socket: &Path) -> &Path {
    socket.parent().unwrap_or_else(|| Path::new("/"))
}

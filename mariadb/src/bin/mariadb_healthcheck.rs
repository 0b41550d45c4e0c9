//! Container health check
//!
//! Exits 0 when the server answers on its local socket, 1 otherwise.
//! Meant for the image's HEALTHCHECK, so it stays quiet on success.

use common::{init_logging, ConfigExt};
use mariadb_bootstrap::bootstrap::ROOT_PASSWORD_VAR;
use mariadb_bootstrap::paths::DEFAULT_SOCKET;
use mariadb_bootstrap::server::{check_health, CliAdmin};
use tracing::warn;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _guard = init_logging("mariadb-healthcheck");

    let socket = String::env_or("MARIADB_SOCKET", DEFAULT_SOCKET);
    let root_password = match String::env_secret(ROOT_PASSWORD_VAR) {
        Ok(password) => password.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Root password unavailable, probing over socket only");
            String::new()
        }
    };

    let admin = CliAdmin::new(socket, root_password);
    if check_health(&admin).await {
        std::process::exit(0);
    }

    warn!("MariaDB is not answering");
    std::process::exit(1);
}

//! MariaDB container entrypoint
//!
//! Provisions the application database and user against a temporary
//! background server, then replaces itself with the foreground server so
//! that it runs as PID 1 for the rest of the container's life.

use anyhow::Result;
use common::init_logging;
use mariadb_bootstrap::bootstrap::{
    read_marker, BootstrapConfig, BootstrapError, Bootstrapper, Step,
};
use mariadb_bootstrap::server::{exec_server, server_args, BackgroundServer, CliAdmin};
use std::env;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging("mariadb-bootstrap");

    let config = match BootstrapConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    info!(
        datadir = %config.datadir.display(),
        socket = %config.socket.display(),
        database = %config.credentials.database,
        user = %config.credentials.user,
        "=== MariaDB bootstrap ==="
    );

    match read_marker(&config.datadir) {
        Ok(Some(previous)) => info!(
            completed_at = %previous.completed_at,
            database = %previous.database,
            "Found previous bootstrap, re-applying"
        ),
        Ok(None) => info!("No previous bootstrap found"),
        Err(e) => warn!(error = %e, "Ignoring unreadable bootstrap marker"),
    }

    let admin = CliAdmin::new(&config.socket, config.credentials.root_password.as_str());
    let engine = BackgroundServer::new(
        &config.datadir,
        &config.socket,
        config.system_user.as_str(),
    );
    let mut bootstrapper = Bootstrapper::new(&config, admin, engine);

    // As PID 1 we get no default signal handling
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let shutdown = async {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    };

    match bootstrapper.run_until(shutdown).await {
        Ok(report) => {
            info!(
                root_password_was_set = report.root_password_was_set,
                fresh_datadir = report.fresh_datadir,
                "Bootstrap finished"
            );
        }
        Err(BootstrapError::Interrupted { signal }) => {
            info!(signal, "Interrupted before hand-off");
            return Ok(());
        }
        Err(e) => {
            let step = e.step().map(|s| s.as_str()).unwrap_or("unknown");
            error!(step, error = %e, "Bootstrap failed");
            std::process::exit(1);
        }
    }

    let extra: Vec<String> = env::args().skip(1).collect();
    let args = server_args(&config.datadir, &config.socket, &config.system_user, &extra);

    info!(command = %config.server_command, "Starting foreground server");
    let err = exec_server(&config.server_command, &args);

    error!(step = %Step::Handoff, error = %err, "Hand-off failed");
    std::process::exit(1);
}

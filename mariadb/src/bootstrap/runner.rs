//! The bootstrap sequence
//!
//! Brings the engine from an unknown state (fresh or reused data directory,
//! root password set or not) to one where the application database and
//! user exist, then stops the background server so the foreground one can
//! take over. Every statement is idempotent, so a run that fails halfway is
//! completed by the next container start.

use super::config::BootstrapConfig;
use super::error::{BootstrapError, Step, StepExt};
use super::marker::{write_marker, BootstrapReport};
use super::sql;
use crate::server::{wait_until_ready, Admin, AuthMode, Engine, ReadinessPolicy};
use anyhow::{anyhow, Result};
use chrono::Utc;
use std::future::Future;
use std::time::Instant;
use tracing::{info, warn};

pub struct Bootstrapper<'a, A, E> {
    config: &'a BootstrapConfig,
    admin: A,
    engine: E,
    auth: AuthMode,
}

impl<'a, A: Admin, E: Engine> Bootstrapper<'a, A, E> {
    pub fn new(config: &'a BootstrapConfig, admin: A, engine: E) -> Self {
        Self {
            config,
            admin,
            engine,
            auth: AuthMode::Socket,
        }
    }

    /// Run every step up to, not including, the hand-off.
    ///
    /// Stops at the first failure and reports which step it was.
    pub async fn run(&mut self) -> Result<BootstrapReport, BootstrapError> {
        let start = Instant::now();
        let config = self.config;
        let creds = &config.credentials;

        let fresh_datadir = self.engine.prepare().await.during(Step::PrepareRuntime)?;

        info!("Starting server in the background");
        self.engine.start().await.during(Step::StartServer)?;

        let policy = ReadinessPolicy {
            interval: config.ready_interval,
            timeout: config.ready_timeout,
        };
        let ready_attempts = wait_until_ready(&self.admin, &mut self.engine, &policy)
            .await
            .during(Step::WaitReady)?;

        let root_password_was_set = self.detect_root_auth().await.during(Step::DetectRootAuth)?;
        self.auth = if root_password_was_set {
            AuthMode::Password
        } else {
            AuthMode::Socket
        };
        info!(root_password_was_set, "Detected root authentication");

        info!(database = %creds.database, user = %creds.user, "Provisioning database and user");
        self.execute(Step::CreateDatabase, &sql::create_database(&creds.database))
            .await?;
        self.execute(Step::CreateUser, &sql::create_user(&creds.user, &creds.password))
            .await?;
        self.execute(
            Step::SyncUserPassword,
            &sql::sync_user_password(&creds.user, &creds.password),
        )
        .await?;
        self.execute(
            Step::GrantPrivileges,
            &sql::grant_all(&creds.database, &creds.user),
        )
        .await?;

        if !root_password_was_set {
            info!("Setting root password");
            self.execute(
                Step::SetRootPassword,
                &sql::set_root_password(&creds.root_password),
            )
            .await?;
            self.auth = AuthMode::Password;
        }

        self.execute(Step::FlushPrivileges, sql::FLUSH_PRIVILEGES).await?;

        self.shutdown().await.during(Step::Shutdown)?;

        let report = BootstrapReport {
            database: creds.database.clone(),
            user: creds.user.clone(),
            root_password_was_set,
            fresh_datadir,
            ready_attempts,
            duration_ms: start.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        };
        // The marker is informational, the server is already provisioned
        if let Err(e) = write_marker(&config.datadir, &report) {
            warn!(error = %e, "Failed to write bootstrap marker");
        }

        info!(duration_ms = report.duration_ms, "Bootstrap completed");
        Ok(report)
    }

    /// Run the sequence until it finishes or `shutdown` resolves.
    ///
    /// `shutdown` yields the name of the signal that interrupted the run.
    /// On interruption or failure the background server is terminated
    /// before returning.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<BootstrapReport, BootstrapError>
    where
        F: Future<Output = &'static str>,
    {
        let outcome = tokio::select! {
            result = self.run() => result,
            signal = shutdown => Err(BootstrapError::Interrupted { signal }),
        };

        if outcome.is_err() {
            info!("Stopping background server");
            self.engine.terminate().await;
        }
        outcome
    }

    /// `true` when root no longer authenticates over the socket alone.
    async fn detect_root_auth(&self) -> Result<bool> {
        Ok(!self.admin.authenticates(AuthMode::Socket).await?)
    }

    async fn execute(&self, step: Step, statement: &str) -> Result<(), BootstrapError> {
        self.admin.execute(self.auth, statement).await.during(step)
    }

    /// Password shutdown first, socket as the fallback, then wait for exit.
    async fn shutdown(&mut self) -> Result<()> {
        if let Err(password_err) = self.admin.shutdown(AuthMode::Password).await {
            warn!(error = %password_err, "Password shutdown failed, trying socket");
            self.admin
                .shutdown(AuthMode::Socket)
                .await
                .map_err(|socket_err| {
                    anyhow!(
                        "shutdown refused with password ({}) and socket ({})",
                        password_err,
                        socket_err
                    )
                })?;
        }

        self.engine.wait_stopped(self.config.shutdown_timeout).await
    }
}

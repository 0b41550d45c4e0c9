//! Waiting for the background server to accept connections

use super::{Admin, AuthMode, Engine};
use anyhow::{bail, Result};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

/// How long and how often to ping the starting server
#[derive(Debug, Clone, Copy)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

/// Ping until the server answers. Returns the number of pings it took.
///
/// Socket authentication is tried first, then the root password. A server
/// that exits while starting, or stays silent past the timeout, is an error.
pub async fn wait_until_ready<A, E>(
    admin: &A,
    engine: &mut E,
    policy: &ReadinessPolicy,
) -> Result<u32>
where
    A: Admin + ?Sized,
    E: Engine + ?Sized,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        if let Some(status) = engine.exited()? {
            bail!("server exited before becoming ready ({})", status);
        }

        if admin.ping(AuthMode::Socket).await? || admin.ping(AuthMode::Password).await? {
            info!(attempt, elapsed = ?start.elapsed(), "Server is ready");
            return Ok(attempt);
        }

        if let Some(limit) = policy.timeout {
            if start.elapsed() >= limit {
                bail!(
                    "server not ready after {}s ({} pings)",
                    limit.as_secs(),
                    attempt
                );
            }
        }

        if attempt % 10 == 0 {
            warn!(attempt, elapsed = ?start.elapsed(), "Still waiting for server");
        }

        sleep(policy.interval).await;
    }
}

//! In-memory stand-ins for the server, used by unit tests
//!
//! `FakeAdmin` models just enough of MariaDB's account handling to check
//! the sequence: root switches from socket to password authentication when
//! its password is set, and each statement mutates a small catalog.

use crate::server::{Admin, AuthMode, Engine};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Durable state the bootstrap is supposed to converge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub root_password_set: bool,
    pub databases: BTreeSet<String>,
    /// account -> password literal
    pub users: BTreeMap<String, String>,
    pub grants: BTreeSet<String>,
}

#[derive(Default)]
struct AdminInner {
    catalog: Catalog,
    ready_after: Option<u32>,
    socket_pings: u32,
    pings: u32,
    executed: Vec<(AuthMode, String)>,
    fail_on: Option<String>,
    /// Root has a password, but not the configured one
    foreign_root_password: bool,
    shutdown_fails: Vec<AuthMode>,
    shutdowns: Vec<AuthMode>,
}

#[derive(Clone)]
pub struct FakeAdmin {
    inner: Arc<Mutex<AdminInner>>,
}

impl FakeAdmin {
    /// Ready on the first ping, root password unset.
    pub fn new() -> Self {
        let inner = AdminInner {
            ready_after: Some(1),
            ..Default::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn ready_after(self, attempts: u32) -> Self {
        self.inner.lock().unwrap().ready_after = Some(attempts);
        self
    }

    pub fn never_ready(self) -> Self {
        self.inner.lock().unwrap().ready_after = None;
        self
    }

    pub fn with_root_password_set(self) -> Self {
        self.inner.lock().unwrap().catalog.root_password_set = true;
        self
    }

    pub fn with_foreign_root_password(self) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.catalog.root_password_set = true;
            inner.foreign_root_password = true;
        }
        self
    }

    /// Fail any statement containing `fragment`.
    pub fn failing_on(self, fragment: &str) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fragment.to_string());
        self
    }

    pub fn clear_failure(&self) {
        self.inner.lock().unwrap().fail_on = None;
    }

    pub fn shutdown_failing_with(self, auth: AuthMode) -> Self {
        self.inner.lock().unwrap().shutdown_fails.push(auth);
        self
    }

    pub fn catalog(&self) -> Catalog {
        self.inner.lock().unwrap().catalog.clone()
    }

    pub fn ping_count(&self) -> u32 {
        self.inner.lock().unwrap().pings
    }

    pub fn executed(&self) -> Vec<(AuthMode, String)> {
        self.inner.lock().unwrap().executed.clone()
    }

    pub fn shutdowns(&self) -> Vec<AuthMode> {
        self.inner.lock().unwrap().shutdowns.clone()
    }
}

fn accepts(inner: &AdminInner, auth: AuthMode) -> bool {
    match auth {
        AuthMode::Socket => !inner.catalog.root_password_set,
        AuthMode::Password => inner.catalog.root_password_set && !inner.foreign_root_password,
    }
}

fn apply(catalog: &mut Catalog, sql: &str) -> Result<()> {
    if let Some(name) = sql.strip_prefix("CREATE DATABASE IF NOT EXISTS ") {
        catalog.databases.insert(name.to_string());
    } else if let Some(rest) = sql.strip_prefix("CREATE USER IF NOT EXISTS ") {
        let (account, password) = rest.split_once(" IDENTIFIED BY ").unwrap_or((rest, ""));
        catalog
            .users
            .entry(account.to_string())
            .or_insert_with(|| password.to_string());
    } else if sql.starts_with("ALTER USER 'root'@'localhost' ") {
        catalog.root_password_set = true;
    } else if let Some(rest) = sql.strip_prefix("ALTER USER ") {
        let (account, password) = rest.split_once(" IDENTIFIED BY ").unwrap_or((rest, ""));
        match catalog.users.get_mut(account) {
            Some(current) => *current = password.to_string(),
            None => bail!("ERROR 1396 (HY000): Operation ALTER USER failed for {}", account),
        }
    } else if sql.starts_with("GRANT ") {
        catalog.grants.insert(sql.to_string());
    }
    Ok(())
}

#[async_trait]
impl Admin for FakeAdmin {
    async fn ping(&self, auth: AuthMode) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.pings += 1;
        if auth == AuthMode::Socket {
            inner.socket_pings += 1;
        }
        Ok(inner
            .ready_after
            .is_some_and(|n| inner.socket_pings >= n))
    }

    async fn authenticates(&self, auth: AuthMode) -> Result<bool> {
        Ok(accepts(&self.inner.lock().unwrap(), auth))
    }

    async fn execute(&self, auth: AuthMode, sql: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !accepts(&inner, auth) {
            bail!("ERROR 1045 (28000): Access denied for user 'root'@'localhost'");
        }
        if inner.fail_on.as_deref().is_some_and(|f| sql.contains(f)) {
            bail!("ERROR 1064 (42000): injected failure");
        }
        inner.executed.push((auth, sql.to_string()));
        apply(&mut inner.catalog, sql)
    }

    async fn shutdown(&self, auth: AuthMode) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.shutdown_fails.contains(&auth) {
            bail!("mariadb-admin failed (exit 1): Access denied");
        }
        inner.shutdowns.push(auth);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct EngineLog {
    pub prepared: bool,
    pub started: bool,
    pub stopped: bool,
    pub terminated: bool,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    log: Arc<Mutex<EngineLog>>,
    fresh: bool,
    dies: bool,
    hangs_on_stop: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(mut self) -> Self {
        self.fresh = true;
        self
    }

    pub fn dies_during_startup(mut self) -> Self {
        self.dies = true;
        self
    }

    pub fn hangs_on_stop(mut self) -> Self {
        self.hangs_on_stop = true;
        self
    }

    pub fn log(&self) -> EngineLog {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn prepare(&mut self) -> Result<bool> {
        self.log.lock().unwrap().prepared = true;
        Ok(self.fresh)
    }

    async fn start(&mut self) -> Result<()> {
        self.log.lock().unwrap().started = true;
        Ok(())
    }

    fn exited(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.dies.then(|| ExitStatus::from_raw(1 << 8)))
    }

    async fn wait_stopped(&mut self, limit: Duration) -> Result<()> {
        if self.hangs_on_stop {
            bail!("server still running {}s after shutdown", limit.as_secs());
        }
        self.log.lock().unwrap().stopped = true;
        Ok(())
    }

    async fn terminate(&mut self) {
        self.log.lock().unwrap().terminated = true;
    }
}

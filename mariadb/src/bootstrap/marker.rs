//! Bootstrap completion marker
//!
//! A JSON report written into the data directory after each successful run.
//! It is informational only; the sequence never skips steps because of it.

use crate::paths::bootstrap_marker;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Outcome of a successful bootstrap run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    pub database: String,
    pub user: String,
    /// Whether root already required a password when the run started
    pub root_password_was_set: bool,
    /// Whether the data directory was initialized by this run
    pub fresh_datadir: bool,
    pub ready_attempts: u32,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

pub fn write_marker(datadir: &Path, report: &BootstrapReport) -> Result<()> {
    let path = bootstrap_marker(datadir);
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(&path, json).context(format!("Failed to write {}", path.display()))
}

/// Read the previous run's report. A missing marker is `Ok(None)`.
pub fn read_marker(datadir: &Path) -> Result<Option<BootstrapReport>> {
    let path = bootstrap_marker(datadir);
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
    let report = serde_json::from_str(&content)
        .context(format!("Failed to parse {}", path.display()))?;
    Ok(Some(report))
}

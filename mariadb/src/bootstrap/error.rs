//! Bootstrap steps and the error reporting which one failed

use std::fmt;
use thiserror::Error;

/// One step of the bootstrap sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PrepareRuntime,
    StartServer,
    WaitReady,
    DetectRootAuth,
    CreateDatabase,
    CreateUser,
    SyncUserPassword,
    GrantPrivileges,
    SetRootPassword,
    FlushPrivileges,
    Shutdown,
    Handoff,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrepareRuntime => "prepare-runtime",
            Self::StartServer => "start-server",
            Self::WaitReady => "wait-ready",
            Self::DetectRootAuth => "detect-root-auth",
            Self::CreateDatabase => "create-database",
            Self::CreateUser => "create-user",
            Self::SyncUserPassword => "sync-user-password",
            Self::GrantPrivileges => "grant-privileges",
            Self::SetRootPassword => "set-root-password",
            Self::FlushPrivileges => "flush-privileges",
            Self::Shutdown => "shutdown",
            Self::Handoff => "handoff",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("bootstrap failed during {step}: {source:#}")]
    Step {
        step: Step,
        #[source]
        source: anyhow::Error,
    },

    #[error("bootstrap interrupted by {signal}")]
    Interrupted { signal: &'static str },
}

impl BootstrapError {
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Step { step, .. } => Some(*step),
            Self::Interrupted { .. } => None,
        }
    }
}

/// Attach the failing step to an `anyhow` result.
pub trait StepExt<T> {
    fn during(self, step: Step) -> Result<T, BootstrapError>;
}

impl<T> StepExt<T> for anyhow::Result<T> {
    fn during(self, step: Step) -> Result<T, BootstrapError> {
        self.map_err(|source| BootstrapError::Step { step, source })
    }
}

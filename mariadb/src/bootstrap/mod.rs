//! Bootstrap components
//!
//! This module provides the provisioning sequence run at container start:
//! - Configuration and credential validation
//! - SQL statement construction
//! - The step-by-step runner and its errors
//! - The completion marker

mod config;
mod error;
mod marker;
mod runner;
pub mod sql;

pub use config::{BootstrapConfig, ConfigError, Credentials, ROOT_PASSWORD_VAR};
pub use error::{BootstrapError, Step, StepExt};
pub use marker::{read_marker, write_marker, BootstrapReport};
pub use runner::Bootstrapper;

//! Shared utilities for the container entrypoints
//!
//! This crate provides common functionality used by every entrypoint binary:
//! - Structured logging initialization
//! - Environment variable parsing helpers
//! - Command execution utilities

pub mod command;
pub mod config;
pub mod logging;

pub use command::{run, run_checked, run_isolated, run_with, CommandOutput};
pub use config::ConfigExt;
pub use logging::init_logging;

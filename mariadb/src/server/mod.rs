//! Server-side components
//!
//! This module provides everything the bootstrap does to the engine:
//! - Administrative access over the local socket
//! - The temporary background server
//! - Readiness polling and health checking
//! - The final hand-off to the foreground server

mod admin;
mod handoff;
mod health;
mod process;
mod readiness;

pub use admin::{Admin, AuthMode, CliAdmin};
pub use handoff::{exec_server, server_args};
pub use health::check_health;
pub use process::{BackgroundServer, Engine};
pub use readiness::{wait_until_ready, ReadinessPolicy};

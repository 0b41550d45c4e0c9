//! MariaDB container bootstrap
//!
//! Prepares a MariaDB data directory for the application (database, user,
//! grants, root password) and then hands the container over to the server.

pub mod bootstrap;
pub mod datadir;
pub mod paths;
pub mod server;

#[cfg(test)]
mod testing;

pub use bootstrap::{BootstrapConfig, BootstrapError, BootstrapReport, Bootstrapper, Step};

//! Liveness check for the running server

use super::{Admin, AuthMode};

/// Check that the server answers on its local socket.
///
/// Password authentication is tried first since a bootstrapped server has
/// the root password set; socket authentication covers the window before.
pub async fn check_health<A: Admin + ?Sized>(admin: &A) -> bool {
    for auth in [AuthMode::Password, AuthMode::Socket] {
        if matches!(admin.ping(auth).await, Ok(true)) {
            return true;
        }
    }
    false
}

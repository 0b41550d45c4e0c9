//! SQL text for the bootstrap statements
//!
//! Every credential is embedded as an escaped string literal and the
//! database name as a quoted identifier. Nothing is interpolated raw.

/// Host scope of the application account
pub const APP_HOST: &str = "%";

/// No-op query used to detect whether root still authenticates over the socket
pub const NOOP_QUERY: &str = "SELECT 1";

/// Sent ahead of every statement on the same connection. Clears
/// `NO_BACKSLASH_ESCAPES` (and any other mode the server's option files set)
/// so that `quote_literal` output is read as intended.
pub const SESSION_SETUP: &str = "SET SESSION sql_mode=''";

pub const FLUSH_PRIVILEGES: &str = "FLUSH PRIVILEGES";

/// Quote a string literal, escaping characters that could end it.
///
/// Relies on backslash escapes, which `SESSION_SETUP` guarantees.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a database name for GRANT, where `_` and `%` are wildcards.
fn quote_grant_database(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '_' | '%' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    quote_identifier(&escaped)
}

/// `'user'@'host'`
pub fn account(user: &str, host: &str) -> String {
    format!("{}@{}", quote_literal(user), quote_literal(host))
}

pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(database))
}

pub fn create_user(user: &str, password: &str) -> String {
    format!(
        "CREATE USER IF NOT EXISTS {} IDENTIFIED BY {}",
        account(user, APP_HOST),
        quote_literal(password)
    )
}

/// Bring an existing account's password in line with the configuration.
pub fn sync_user_password(user: &str, password: &str) -> String {
    format!(
        "ALTER USER {} IDENTIFIED BY {}",
        account(user, APP_HOST),
        quote_literal(password)
    )
}

pub fn grant_all(database: &str, user: &str) -> String {
    format!(
        "GRANT ALL PRIVILEGES ON {}.* TO {}",
        quote_grant_database(database),
        account(user, APP_HOST)
    )
}

pub fn set_root_password(password: &str) -> String {
    format!(
        "ALTER USER {} IDENTIFIED BY {}",
        account("root", "localhost"),
        quote_literal(password)
    )
}

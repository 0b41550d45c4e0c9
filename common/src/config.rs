//! Environment variable parsing helpers
//!
//! Provides ergonomic helpers for reading configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::str::FromStr;

/// Extension trait for parsing environment variables.
///
/// Provides convenient methods for reading env vars with defaults, required values,
/// secrets and type parsing.
pub trait ConfigExt {
    /// Get an environment variable with a default value.
    ///
    /// # Example
    /// ```ignore
    /// let datadir = String::env_or("MARIADB_DATADIR", "/var/lib/mysql");
    /// ```
    fn env_or(name: &str, default: &str) -> String {
        env::var(name).unwrap_or_else(|_| default.to_string())
    }

    /// Get a required environment variable, returning an error if not set.
    fn env_required(name: &str) -> Result<String> {
        env::var(name).context(format!("{} must be set", name))
    }

    /// Get an environment variable parsed as a specific type.
    ///
    /// Returns `default` if the variable is not set or fails to parse.
    ///
    /// # Example
    /// ```ignore
    /// let timeout: u64 = u64::env_parse("MARIADB_READY_TIMEOUT", 120);
    /// ```
    fn env_parse<T: FromStr>(name: &str, default: T) -> T {
        env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a secret from `NAME` or from the file named by `NAME_FILE`.
    ///
    /// The file form is what Docker/compose secrets provide. One trailing
    /// newline is stripped from file contents. Setting both forms is an error.
    fn env_secret(name: &str) -> Result<Option<String>> {
        let file_var = format!("{}_FILE", name);
        match (env::var(name).ok(), env::var(&file_var).ok()) {
            (Some(_), Some(_)) => bail!("both {} and {} are set", name, file_var),
            (Some(value), None) => Ok(Some(value)),
            (None, Some(path)) => {
                let content = fs::read_to_string(&path)
                    .context(format!("Failed to read {} from {}", name, path))?;
                let value = content
                    .strip_suffix('\n')
                    .map(|v| v.strip_suffix('\r').unwrap_or(v))
                    .unwrap_or(&content);
                Ok(Some(value.to_string()))
            }
            (None, None) => Ok(None),
        }
    }
}

// Blanket implementation for all types
impl<T> ConfigExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        env::set_var("COMMON_TEST_PARSE_GARBAGE", "soon");
        assert_eq!(u64::env_parse("COMMON_TEST_PARSE_GARBAGE", 7), 7);
        env::set_var("COMMON_TEST_PARSE_OK", "42");
        assert_eq!(u64::env_parse("COMMON_TEST_PARSE_OK", 7), 42);
    }

    #[test]
    fn test_env_secret_reads_file_and_trims_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hunter2").unwrap();
        env::set_var("COMMON_TEST_SECRET_FILE", file.path().to_str().unwrap());

        let secret = String::env_secret("COMMON_TEST_SECRET").unwrap();
        assert_eq!(secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_env_secret_rejects_both_forms() {
        env::set_var("COMMON_TEST_BOTH", "inline");
        env::set_var("COMMON_TEST_BOTH_FILE", "/dev/null");
        assert!(String::env_secret("COMMON_TEST_BOTH").is_err());
    }

    #[test]
    fn test_env_secret_unset_is_none() {
        assert!(String::env_secret("COMMON_TEST_NEVER_SET")
            .unwrap()
            .is_none());
    }
}

//! Runtime configuration
//!
//! Every setting has a default and can be overridden by an environment
//! variable; the CLI flags in turn override the environment.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB: &str = "YC_ROSTER_DB";
pub const ENV_API_URL: &str = "YC_ROSTER_API_URL";
pub const ENV_BIND: &str = "YC_ROSTER_BIND";
pub const ENV_LOG: &str = "YC_ROSTER_LOG";
pub const ENV_LOG_FILE: &str = "YC_ROSTER_LOG_FILE";
pub const ENV_TIMEOUT: &str = "YC_ROSTER_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database served by the API
    pub db_path: PathBuf,

    /// Base URL the client talks to
    pub api_url: String,

    /// Address the API server listens on
    pub bind_addr: String,

    /// Default log filter when RUST_LOG is unset
    pub log_level: String,

    /// Log destination for the terminal UI
    pub log_file: Option<PathBuf>,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("yc_companies.db"),
            api_url: "http://localhost:5001".to_string(),
            bind_addr: "0.0.0.0:5001".to_string(),
            log_level: "info".to_string(),
            log_file: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let request_timeout = match get(ENV_TIMEOUT) {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .with_context(|| format!("{} must be a whole number of seconds, got {:?}", ENV_TIMEOUT, v))?,
            ),
            None => defaults.request_timeout,
        };

        Ok(Self {
            db_path: get(ENV_DB).map(PathBuf::from).unwrap_or(defaults.db_path),
            api_url: get(ENV_API_URL).unwrap_or(defaults.api_url),
            bind_addr: get(ENV_BIND).unwrap_or(defaults.bind_addr),
            log_level: get(ENV_LOG).unwrap_or(defaults.log_level),
            log_file: get(ENV_LOG_FILE).map(PathBuf::from),
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "http://localhost:5001");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_DB, "/tmp/yc.db"),
            (ENV_API_URL, "http://api.internal:8080"),
            (ENV_LOG, "debug"),
            (ENV_LOG_FILE, "/tmp/yc.log"),
            (ENV_TIMEOUT, "3"),
            (ENV_BIND, "  "),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/yc.db"));
        assert_eq!(config.api_url, "http://api.internal:8080");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/yc.log")));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        // Blank falls back to the default
        assert_eq!(config.bind_addr, "0.0.0.0:5001");
    }

    #[test]
    fn test_bad_timeout_is_error() {
        let err = Config::from_lookup(lookup(&[(ENV_TIMEOUT, "soon")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT));
    }
}

//! Configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Feed service configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Address the feed server listens on.
    pub bind_addr: String,
    /// Location of the SQLite file backing the store.
    pub db_path: PathBuf,
    /// Address of the demonstration-pages server.
    pub cases_bind_addr: String,
    /// Directory holding the demonstration pages.
    pub cases_dir: PathBuf,
    /// Deadline for opening and initialising the store.
    pub startup_timeout: Duration,
    /// Deadline applied to each request's store operation.
    pub request_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:666".to_string(),
            db_path: PathBuf::from("./feeds.db"),
            cases_bind_addr: "0.0.0.0:777".to_string(),
            cases_dir: PathBuf::from("./cases"),
            startup_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl FeedConfig {
    /// Load configuration from environment variables.
    ///
    /// All values are optional:
    /// - `FEED_BIND_ADDR` (default: "0.0.0.0:666")
    /// - `FEED_DB_PATH` (default: "./feeds.db")
    /// - `FEED_CASES_BIND_ADDR` (default: "0.0.0.0:777")
    /// - `FEED_CASES_DIR` (default: "./cases")
    /// - `FEED_STARTUP_TIMEOUT_SECS` (default: 10)
    /// - `FEED_REQUEST_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            bind_addr: lookup("FEED_BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_path: lookup("FEED_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            cases_bind_addr: lookup("FEED_CASES_BIND_ADDR").unwrap_or(defaults.cases_bind_addr),
            cases_dir: lookup("FEED_CASES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cases_dir),
            startup_timeout: parse_secs(&lookup, "FEED_STARTUP_TIMEOUT_SECS")?
                .unwrap_or(defaults.startup_timeout),
            request_timeout: parse_secs(&lookup, "FEED_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout),
        };

        tracing::info!(
            bind_addr = %config.bind_addr,
            db_path = %config.db_path.display(),
            cases_bind_addr = %config.cases_bind_addr,
            "Feed configuration loaded"
        );

        Ok(config)
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected whole seconds, got {raw:?}: {e}"),
        })
}

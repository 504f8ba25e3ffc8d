//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If none are set, falls back to loading from a config file
//! 3. Probes multiple paths for config files
//! 4. Falls back to built-in defaults when no source is found
//!
//! ## Environment Variables
//! - `REPFLOW_YOUTUBE_API_KEY`: API key for the best-effort title lookup
//! - `REPFLOW_USER_NAMESPACE`: Document-store namespace for the single user
//! - `REPFLOW_WATCH_TICK_SECS`: Watch-time accrual tick interval in seconds
//!
//! ## File Locations
//! The loader probes `./config.toml` and `./repflow.toml` in the current
//! working directory.

use std::path::{Path, PathBuf};

use repflow_domain::constants::{DEFAULT_USER_NAMESPACE, WATCH_TICK_SECS};
use repflow_domain::{RepFlowError, Result};
use serde::Deserialize;
use tracing::{debug, info};

const ENV_YOUTUBE_API_KEY: &str = "REPFLOW_YOUTUBE_API_KEY";
const ENV_USER_NAMESPACE: &str = "REPFLOW_USER_NAMESPACE";
const ENV_WATCH_TICK_SECS: &str = "REPFLOW_WATCH_TICK_SECS";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// API key for the video-platform metadata lookup; absence simply
    /// disables the lookup.
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    /// Namespace the document store keys all collections under.
    #[serde(default = "default_namespace")]
    pub user_namespace: String,
    /// Watch-time accrual tick interval in seconds.
    #[serde(default = "default_watch_tick_secs")]
    pub watch_tick_secs: u64,
}

fn default_namespace() -> String {
    DEFAULT_USER_NAMESPACE.to_string()
}

fn default_watch_tick_secs() -> u64 {
    WATCH_TICK_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            user_namespace: default_namespace(),
            watch_tick_secs: default_watch_tick_secs(),
        }
    }
}

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `RepFlowError::Config` if a present source has invalid values
/// (unparseable tick interval, malformed TOML).
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    if let Some(config) = load_from_env()? {
        info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    if let Some(config) = load_from_file(None)? {
        info!("Configuration loaded from file");
        return Ok(config);
    }

    debug!("No configuration source found, using defaults");
    Ok(Config::default())
}

/// Load configuration from environment variables.
///
/// Returns `Ok(None)` when no `REPFLOW_*` variable is set at all, so the
/// caller can fall back to a file.
///
/// # Errors
/// Returns `RepFlowError::Config` when a set variable has an invalid value.
pub fn load_from_env() -> Result<Option<Config>> {
    let youtube_api_key = std::env::var(ENV_YOUTUBE_API_KEY).ok().filter(|v| !v.is_empty());
    let user_namespace = std::env::var(ENV_USER_NAMESPACE).ok().filter(|v| !v.is_empty());
    let watch_tick = std::env::var(ENV_WATCH_TICK_SECS).ok().filter(|v| !v.is_empty());

    if youtube_api_key.is_none() && user_namespace.is_none() && watch_tick.is_none() {
        return Ok(None);
    }

    let watch_tick_secs = match watch_tick {
        Some(raw) => raw.parse::<u64>().map_err(|e| {
            RepFlowError::Config(format!("Invalid watch tick interval: {e}"))
        })?,
        None => default_watch_tick_secs(),
    };

    Ok(Some(Config {
        youtube_api_key,
        user_namespace: user_namespace.unwrap_or_else(default_namespace),
        watch_tick_secs,
    }))
}

/// Load configuration from a TOML file.
///
/// If `path` is `None`, probes the default locations and returns `Ok(None)`
/// when no file exists.
///
/// # Errors
/// Returns `RepFlowError::Config` when the file cannot be read or parsed.
pub fn load_from_file(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match probe_config_paths() {
            Some(found) => found,
            None => return Ok(None),
        },
    };

    debug!(path = %path.display(), "Reading configuration file");
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        RepFlowError::Config(format!("Failed to read {}: {e}", path.display()))
    })?;
    let config = toml::from_str(&contents).map_err(|e| {
        RepFlowError::Config(format!("Failed to parse {}: {e}", path.display()))
    })?;
    Ok(Some(config))
}

fn probe_config_paths() -> Option<PathBuf> {
    ["config.toml", "repflow.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

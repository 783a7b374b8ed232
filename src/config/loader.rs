//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// App name handed to the analytics sink when nothing else is configured.
pub const DEFAULT_APP_NAME: &str = "memory-match";

/// Substring the host's timeout notification carries.
pub const DEFAULT_TIMEOUT_MARKER: &str = "Time's Up";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FLIPWATCH_CONFIG";

/// Environment override for [`ResolvedConfig::app_name`].
pub const APP_NAME_ENV: &str = "FLIPWATCH_APP_NAME";

/// Environment override for [`ResolvedConfig::timeout_marker`].
pub const TIMEOUT_MARKER_ENV: &str = "FLIPWATCH_TIMEOUT_MARKER";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional. Corresponds to `~/.config/flipwatch/config.toml`:
///
/// ```toml
/// app_name = "memory-match"
/// timeout_marker = "Time's Up"
/// require_timer_for_timeout = true
/// log_file_path = "/tmp/flipwatch.log"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// App name passed to the sink on initialize.
    #[serde(default)]
    pub app_name: Option<String>,

    /// Notification substring treated as a level timeout.
    #[serde(default)]
    pub timeout_marker: Option<String>,

    /// Only honor timeout notifications while the host's timer runs.
    #[serde(default)]
    pub require_timer_for_timeout: Option<bool>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// App name.
    pub app_name: String,
    /// Timeout marker.
    pub timeout_marker: String,
    /// Timer gating for timeout detection.
    pub require_timer_for_timeout: bool,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            timeout_marker: DEFAULT_TIMEOUT_MARKER.to_string(),
            require_timer_for_timeout: true,
            log_file_path: default_log_path(),
        }
    }
}

/// CLI flags that override the resolved config when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--app-name`
    pub app_name: Option<String>,
    /// `--timeout-marker`
    pub timeout_marker: Option<String>,
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/flipwatch/flipwatch.log` on Linux, the platform
/// equivalent elsewhere, or `flipwatch.log` in the current directory when no
/// state directory exists.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("flipwatch").join("flipwatch.log")
    } else {
        PathBuf::from("flipwatch.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if the file doesn't exist.
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path (`~/.config/flipwatch/config.toml` on Linux).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flipwatch").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `FLIPWATCH_CONFIG` environment variable
/// 3. Default path from [`default_config_path`]
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply `FLIPWATCH_APP_NAME` and `FLIPWATCH_TIMEOUT_MARKER`.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(app_name) = std::env::var(APP_NAME_ENV) {
        config.app_name = app_name;
    }

    if let Ok(marker) = std::env::var(TIMEOUT_MARKER_ENV) {
        config.timeout_marker = marker;
    }

    config
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        app_name: config.app_name.unwrap_or(defaults.app_name),
        timeout_marker: config.timeout_marker.unwrap_or(defaults.timeout_marker),
        require_timer_for_timeout: config
            .require_timer_for_timeout
            .unwrap_or(defaults.require_timer_for_timeout),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, cli: CliOverrides) -> ResolvedConfig {
    if let Some(app_name) = cli.app_name {
        config.app_name = app_name;
    }

    if let Some(marker) = cli.timeout_marker {
        config.timeout_marker = marker;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

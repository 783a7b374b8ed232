//! Configuration module.
//!
//! Layering follows defaults → config file → environment → CLI flags, see
//! [`loader`].

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, CliOverrides, ConfigError,
    ConfigFile, ResolvedConfig, DEFAULT_APP_NAME, DEFAULT_TIMEOUT_MARKER,
};

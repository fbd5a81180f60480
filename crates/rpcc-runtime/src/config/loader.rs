//! Configuration loader.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config file (optional, TOML)
//! 3. Environment variables (`RPCC_*`)
//!
//! Each layer overrides the previous.

use super::{ConfigError, ServerConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```
/// use rpcc_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_file("/nonexistent/rpcc.toml")
///     .skip_env_vars()
///     .load()
///     .unwrap();
/// assert_eq!(config.log_level, "info");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Config file path. A missing file is skipped.
    path: Option<PathBuf>,

    /// Skip environment variable loading.
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the config file path.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or if an environment variable is invalid.
    pub fn load(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = ServerConfig::default();

        if let Some(path) = &self.path {
            if let Some(file_config) = Self::load_file(path)? {
                debug!(path = %path.display(), "Loaded config file");
                config = file_config;
            }
        }

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }

        Ok(config)
    }

    /// Loads a config file, returning None if it doesn't exist.
    fn load_file(path: &Path) -> Result<Option<ServerConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ServerConfig::from_toml(&content).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }
}

/// Applies `RPCC_*` overrides read through `var`.
fn apply_env(
    config: &mut ServerConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(val) = var("RPCC_SERVICE_NAME") {
        config.service_name = non_blank("RPCC_SERVICE_NAME", val)?;
    }
    if let Some(val) = var("RPCC_NODE_NAME") {
        config.node_name = Some(non_blank("RPCC_NODE_NAME", val)?);
    }
    if let Some(val) = var("RPCC_LOG_LEVEL") {
        config.log_level = val;
    }
    if let Some(val) = var("RPCC_SUPERUSERS") {
        config.superusers = parse_user_list(&val).ok_or(ConfigError::EmptyUserName {
            var: "RPCC_SUPERUSERS",
            value: val,
        })?;
    }
    Ok(())
}

fn non_blank(var: &'static str, val: String) -> Result<String, ConfigError> {
    if val.trim().is_empty() {
        Err(ConfigError::BlankName { var })
    } else {
        Ok(val)
    }
}

/// Comma separated user names. Blank input is an empty list.
fn parse_user_list(s: &str) -> Option<Vec<String>> {
    if s.trim().is_empty() {
        return Some(Vec::new());
    }
    s.split(',')
        .map(|name| {
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

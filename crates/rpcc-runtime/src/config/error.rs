//! Startup configuration errors.
//!
//! All of these stop the server before it registers anything. Callers get
//! no protocol error for them.

use std::path::PathBuf;
use thiserror::Error;

/// Why the server configuration could not be assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file given with `--config` exists but cannot be read.
    #[error("cannot read RPCC config file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid `ServerConfig` table, for example
    /// `superusers` given as a string or a non-numeric
    /// `api_version_comments` key.
    #[error("RPCC config file {} is not valid: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// `RPCC_SUPERUSERS` has an empty entry between commas.
    #[error("{var}={value:?}: expected comma separated user names, found an empty one")]
    EmptyUserName { var: &'static str, value: String },

    /// `RPCC_SERVICE_NAME` or `RPCC_NODE_NAME` is set to a blank string.
    #[error("{var} is set but blank; unset it to keep the default")]
    BlankName { var: &'static str },
}

impl ConfigError {
    /// The `RPCC_*` variable at fault, if the error came from the
    /// environment.
    #[must_use]
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::EmptyUserName { var, .. } | Self::BlankName { var } => Some(*var),
            Self::Unreadable { .. } | Self::Malformed { .. } => None,
        }
    }
}

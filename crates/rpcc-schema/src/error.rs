//! Descriptor construction errors.
//!
//! These are startup configuration defects, reported while building
//! descriptors and never seen by callers.

use thiserror::Error;

/// A descriptor could not be built.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The string regexp does not compile.
    #[error("type {name}: invalid regexp '{pattern}': {source}")]
    InvalidRegexp {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Integer range with `min > max`.
    #[error("type {name}: empty integer range {min}-{max}")]
    EmptyRange { name: String, min: i64, max: i64 },

    /// Enum without values.
    #[error("type {name}: enum has no values")]
    EmptyEnum { name: String },

    /// A struct key declared both mandatory and optional.
    #[error("type {name}: key '{key}' is both mandatory and optional")]
    DuplicateMember { name: String, key: String },

    /// A type left with no API version, by an empty range or by members
    /// that share none.
    #[error("type {name}: no API version where the type and all its members are valid")]
    NoCommonVersion { name: String },
}

impl SchemaError {
    /// Returns the name of the descriptor that failed.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::InvalidRegexp { name, .. }
            | Self::EmptyRange { name, .. }
            | Self::EmptyEnum { name }
            | Self::DuplicateMember { name, .. }
            | Self::NoCommonVersion { name } => name,
        }
    }
}

//! Configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server configuration.
///
/// Every field is optional in the TOML file.
///
/// # Example
///
/// ```
/// use rpcc_runtime::config::ServerConfig;
///
/// let config = ServerConfig::from_toml(r#"
/// node_name = "db-1"
/// superusers = ["root"]
///
/// [api_version_comments]
/// 0 = "Initial API"
/// "#).unwrap();
///
/// assert_eq!(config.service_name, "rpcc");
/// assert_eq!(config.api_version_comments.get(&0).map(String::as_str), Some("Initial API"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Service name, used in logs and documentation.
    pub service_name: String,

    /// Reported by `server_node_name`. Falls back to the service name.
    pub node_name: Option<String>,

    /// User names granted by the server-wide superuser guard. Empty keeps
    /// the guard at never-allow.
    pub superusers: Vec<String>,

    /// Default `tracing` filter when `RPCC_LOG` is unset.
    pub log_level: String,

    /// Comments shown by `server_list_api_versions`.
    #[serde(with = "version_keys")]
    pub api_version_comments: BTreeMap<u32, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: "rpcc".to_string(),
            node_name: None,
            superusers: Vec::new(),
            log_level: "info".to_string(),
            api_version_comments: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node name, or the service name when unset.
    #[must_use]
    pub fn node_name(&self) -> &str {
        self.node_name.as_deref().unwrap_or(&self.service_name)
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// TOML table keys are strings; versions are numbers.
mod version_keys {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<u32, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, &String> =
            map.iter().map(|(k, v)| (k.to_string(), v)).collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u32, String>, D::Error> {
        let keyed = BTreeMap::<String, String>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(k, v)| {
                k.parse::<u32>()
                    .map(|version| (version, v))
                    .map_err(|_| D::Error::custom(format!("invalid API version '{k}'")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = ServerConfig::default();
        config.node_name = Some("node-a".into());
        config.api_version_comments.insert(1, "Adds hosts".into());
        config.superusers = vec!["root".into()];

        let toml = config.to_toml().unwrap();
        assert_eq!(ServerConfig::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn non_numeric_version_key_is_rejected() {
        let err = ServerConfig::from_toml("[api_version_comments]\nlatest = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("latest"));
    }

    #[test]
    fn node_name_falls_back_to_service_name() {
        let config = ServerConfig::default();
        assert_eq!(config.node_name(), "rpcc");
    }
}

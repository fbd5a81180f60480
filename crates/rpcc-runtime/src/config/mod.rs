//! Server configuration.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────┐
//! │  1. Environment Variables (RPCC_*)      │  Runtime override
//! ├─────────────────────────────────────────┤
//! │  2. Config file (--config <path>)       │  Deployment
//! ├─────────────────────────────────────────┤
//! │  3. Default Values (compile-time)       │  Fallback
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `RPCC_SERVICE_NAME` | `service_name` | String |
//! | `RPCC_NODE_NAME` | `node_name` | String |
//! | `RPCC_SUPERUSERS` | `superusers` | comma separated |
//! | `RPCC_LOG_LEVEL` | `log_level` | String |
//!
//! # Example Configuration
//!
//! ```toml
//! service_name = "hostdb"
//! node_name = "hostdb-1"
//! superusers = ["root"]
//! log_level = "info"
//!
//! [api_version_comments]
//! 0 = "Initial API"
//! 1 = "Adds DHCP groups"
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::ServerConfig;

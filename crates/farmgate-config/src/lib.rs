//! Typed configuration for Farmgate.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`FARMGATE__SECTION__KEY`)
//! - Strict validation (unknown fields are rejected)
//! - Layered loading (defaults, then file, then env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! max_payload_bytes = 10485760
//! json_preview_chars = 200
//!
//! [versioning]
//! supported = ["v1", "v2"]
//! sunset_env_key = "API_SUNSET_DATE"
//!
//! [versioning.deprecated]
//! v1 = "2027-06-30"
//!
//! [discovery]
//! cache_key = "farmgate:routes"
//! cache_ttl_secs = 86400
//! local_cache_enabled = true
//! shared_cache_dir = "/var/cache/farmgate"
//! scan_ttl_secs = 3600
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::FarmgateConfig;
pub use error::ConfigError;
pub use farmgate_telemetry::LogFormat;
pub use loader::ConfigLoader;
pub use schema::{DiscoveryConfig, DispatchConfig, LoggingConfig, VersioningConfig};

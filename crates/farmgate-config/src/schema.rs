//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills omitted fields with
//! their defaults.

use farmgate_telemetry::{LogConfig, LogFormat};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request dispatch section.
///
/// ```
/// use farmgate_config::DispatchConfig;
///
/// let config = DispatchConfig::default();
/// assert_eq!(config.max_payload_bytes, 10 * 1024 * 1024);
/// assert_eq!(config.json_preview_chars, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// Characters of a malformed JSON body kept in the log preview.
    #[serde(default = "default_json_preview_chars")]
    pub json_preview_chars: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: default_max_payload_bytes(),
            json_preview_chars: default_json_preview_chars(),
        }
    }
}

fn default_max_payload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_json_preview_chars() -> usize {
    200
}

/// API versioning section.
///
/// `deprecated` maps a version to its sunset date. An empty date defers to
/// the `sunset_env_key` lookup at response time.
///
/// ```toml
/// [versioning]
/// supported = ["v1", "v2"]
/// sunset_env_key = "API_SUNSET_DATE"
///
/// [versioning.deprecated]
/// v1 = "2027-06-30"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VersioningConfig {
    /// Supported versions; the first is the default, the last the latest.
    #[serde(default = "default_supported")]
    pub supported: Vec<String>,

    /// Deprecated versions and their sunset dates.
    #[serde(default)]
    pub deprecated: IndexMap<String, String>,

    /// Lookup key for the sunset date fallback.
    #[serde(default = "default_sunset_env_key")]
    pub sunset_env_key: String,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            supported: default_supported(),
            deprecated: IndexMap::new(),
            sunset_env_key: default_sunset_env_key(),
        }
    }
}

fn default_supported() -> Vec<String> {
    vec!["v1".to_string()]
}

fn default_sunset_env_key() -> String {
    "API_SUNSET_DATE".to_string()
}

/// Route discovery section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Key under which the route snapshot is stored.
    #[serde(default = "default_cache_key")]
    pub cache_key: String,

    /// Snapshot lifetime in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Enables the in-process cache tier.
    #[serde(default = "default_local_cache_enabled")]
    pub local_cache_enabled: bool,

    /// Directory of the shared file cache tier. `None` disables the tier.
    #[serde(default)]
    pub shared_cache_dir: Option<PathBuf>,

    /// Lifetime of cached directory scans in seconds.
    #[serde(default = "default_scan_ttl_secs")]
    pub scan_ttl_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            cache_key: default_cache_key(),
            cache_ttl_secs: default_cache_ttl_secs(),
            local_cache_enabled: default_local_cache_enabled(),
            shared_cache_dir: None,
            scan_ttl_secs: default_scan_ttl_secs(),
        }
    }
}

fn default_cache_key() -> String {
    "farmgate:routes".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

fn default_local_cache_enabled() -> bool {
    true
}

fn default_scan_ttl_secs() -> u64 {
    3_600
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directives (e.g., "info" or "farmgate_router=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Builds the telemetry settings, starting from the preset matching the format.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        base.with_level(self.level.clone())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: DiscoveryConfig = toml::from_str("cache_ttl_secs = 60").unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.cache_key, "farmgate:routes");
        assert!(config.local_cache_enabled);
        assert!(config.shared_cache_dir.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<DispatchConfig, _> = toml::from_str("max_body = 10");
        assert!(result.is_err());
    }

    #[test]
    fn test_deprecated_table_keeps_order() {
        let config: VersioningConfig = toml::from_str(
            r#"
            supported = ["v1", "v2", "v3"]
            [deprecated]
            v2 = ""
            v1 = "2027-06-30"
            "#,
        )
        .unwrap();
        let keys: Vec<_> = config.deprecated.keys().cloned().collect();
        assert_eq!(keys, ["v2", "v1"]);
    }

    #[test]
    fn test_logging_to_log_config() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        };
        let log = logging.to_log_config();
        assert_eq!(log.level, "warn");
        assert_eq!(log.format, LogFormat::Pretty);
        assert!(log.span_events);

        let json = LoggingConfig::default().to_log_config();
        assert_eq!(json.format, LogFormat::Json);
        assert_eq!(json.level, "info");
    }
}

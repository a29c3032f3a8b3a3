//! Root configuration type.

use farmgate_telemetry::LogFormat;
use farmgate_versioning::validate_tag;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, DiscoveryConfig, DispatchConfig, LoggingConfig, VersioningConfig};

/// Complete Farmgate configuration.
///
/// # Example
///
/// ```
/// use farmgate_config::FarmgateConfig;
///
/// let config = FarmgateConfig::default();
/// assert_eq!(config.versioning.supported, ["v1"]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FarmgateConfig {
    /// Body decoding limits.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Supported and deprecated API versions.
    #[serde(default)]
    pub versioning: VersioningConfig,

    /// Route discovery caching.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FarmgateConfig {
    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.max_payload_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "dispatch.max_payload_bytes",
                "must be greater than zero",
            ));
        }

        if self.versioning.supported.is_empty() {
            return Err(ConfigError::invalid_value(
                "versioning.supported",
                "at least one version is required",
            ));
        }

        for version in &self.versioning.supported {
            validate_tag(version)
                .map_err(|e| ConfigError::invalid_value("versioning.supported", e.to_string()))?;
        }

        for version in self.versioning.deprecated.keys() {
            if !self.versioning.supported.contains(version) {
                return Err(ConfigError::invalid_value(
                    "versioning.deprecated",
                    format!("'{version}' is not a supported version"),
                ));
            }
        }

        if self.versioning.sunset_env_key.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "versioning.sunset_env_key",
                "must not be empty",
            ));
        }

        if self.discovery.cache_key.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "discovery.cache_key",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, no shared cache.
    ///
    /// ```
    /// use farmgate_config::{FarmgateConfig, LogFormat};
    ///
    /// let config = FarmgateConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            discovery: DiscoveryConfig {
                cache_ttl_secs: 60,
                scan_ttl_secs: 60,
                ..DiscoveryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production preset: JSON info logs and the default cache lifetimes.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
            },
            ..Self::default()
        }
    }
}

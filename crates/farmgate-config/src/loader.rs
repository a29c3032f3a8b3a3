//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use farmgate_telemetry::LogFormat;
use indexmap::IndexMap;

use crate::{ConfigError, FarmgateConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use farmgate_config::ConfigLoader;
///
/// # fn main() -> Result<(), farmgate_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("farmgate.toml")?
///     .with_env_prefix("FARMGATE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: FarmgateConfig,
    env_prefix: Option<String>,
    env_source: Option<Vec<(String, String)>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: FarmgateConfig::default(),
            env_prefix: None,
            env_source: None,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = FarmgateConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use farmgate_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = FarmgateConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = FarmgateConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension, or does not match the schema.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let file_config = Self::parse_file(&content, path)?;
        self.merge_config(file_config);

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the named format ("toml" or "json").
    ///
    /// ```
    /// use farmgate_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [versioning]
    ///     supported = ["v1", "v2"]
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.versioning.supported, ["v1", "v2"]);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let file_config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        self.merge_config(file_config);
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `FARMGATE__DISCOVERY__CACHE_TTL_SECS=600`. List values are comma
    /// separated: `FARMGATE__VERSIONING__SUPPORTED=v1,v2` and
    /// `FARMGATE__VERSIONING__DEPRECATED=v1=2027-06-30`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Reads overrides from the given pairs instead of the process environment.
    #[must_use]
    pub fn with_env_source<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_source = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Load a `.env` file from the current directory into the process
    /// environment. A missing file is not an error.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific `.env` file into the process environment.
    pub fn with_dotenv_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override fails to parse or validation fails.
    pub fn load(mut self) -> Result<FarmgateConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without applying overrides or validating.
    #[must_use]
    pub fn load_unvalidated(self) -> FarmgateConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<FarmgateConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    // Full replace; omitted fields already carry serde defaults.
    fn merge_config(&mut self, file_config: FarmgateConfig) {
        self.config = file_config;
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = match self.env_source.take() {
            Some(vars) => vars,
            None => env::vars().collect(),
        };
        vars.retain(|(k, _)| k.starts_with(&marker));
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["DISPATCH", "MAX_PAYLOAD_BYTES"] => {
                self.config.dispatch.max_payload_bytes = parse_integer(key, value)?;
            }
            ["DISPATCH", "JSON_PREVIEW_CHARS"] => {
                self.config.dispatch.json_preview_chars = parse_integer(key, value)?;
            }
            ["VERSIONING", "SUPPORTED"] => {
                self.config.versioning.supported = parse_list(value).map(str::to_string).collect();
            }
            ["VERSIONING", "DEPRECATED"] => {
                self.config.versioning.deprecated = parse_deprecated(value);
            }
            ["VERSIONING", "SUNSET_ENV_KEY"] => {
                self.config.versioning.sunset_env_key = value.to_string();
            }
            ["DISCOVERY", "CACHE_KEY"] => {
                self.config.discovery.cache_key = value.to_string();
            }
            ["DISCOVERY", "CACHE_TTL_SECS"] => {
                self.config.discovery.cache_ttl_secs = parse_integer(key, value)?;
            }
            ["DISCOVERY", "LOCAL_CACHE_ENABLED"] => {
                self.config.discovery.local_cache_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["DISCOVERY", "SHARED_CACHE_DIR"] => {
                self.config.discovery.shared_cache_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            ["DISCOVERY", "SCAN_TTL_SECS"] => {
                self.config.discovery.scan_ttl_secs = parse_integer(key, value)?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value
                    .parse::<LogFormat>()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }
            // Unknown keys are ignored
            _ => {}
        }
        Ok(())
    }
}

fn parse_integer<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// `v1=2027-06-30,v2` into `{v1: "2027-06-30", v2: ""}`.
fn parse_deprecated(value: &str) -> IndexMap<String, String> {
    parse_list(value)
        .map(|item| match item.split_once('=') {
            Some((version, date)) => (version.trim().to_string(), date.trim().to_string()),
            None => (item.to_string(), String::new()),
        })
        .collect()
}

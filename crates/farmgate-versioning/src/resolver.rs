//! Version resolution, prefix stripping and deprecation headers.

use crate::features::FeatureMatrix;
use farmgate_core::{ConfigLookup, EnvLookup, VersionContext};
use http::header::WARNING;
use http::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Request header naming the desired version (`v2` or `2`).
pub const ACCEPT_VERSION_HEADER: &str = "accept-version";
/// Response header carrying the resolved version.
pub const API_VERSION_HEADER: &str = "x-api-version";
/// Response header carrying the newest supported version.
pub const API_LATEST_VERSION_HEADER: &str = "x-api-latest-version";
/// Response header present on deprecated versions.
pub const API_DEPRECATED_HEADER: &str = "x-api-deprecated";
/// Response header carrying the sunset date of a deprecated version.
pub const API_SUNSET_DATE_HEADER: &str = "x-api-sunset-date";

const DEFAULT_SUNSET_ENV_KEY: &str = "API_SUNSET_DATE";
const UNKNOWN_SUNSET: &str = "TBD";

/// Errors raised while configuring a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Tag is not of the form `v<digits>`.
    #[error("invalid version tag '{0}': expected v<number>")]
    InvalidTag(String),

    /// No supported versions were configured.
    #[error("at least one supported version is required")]
    NoVersions,

    /// Version is not in the supported list.
    #[error("version '{0}' is not supported")]
    Unsupported(String),
}

/// Resolves the API version of a request.
///
/// The first supported version is the default; the last is the latest.
pub struct VersionResolver {
    supported: Vec<String>,
    deprecated: IndexMap<String, Option<String>>,
    lookup: Arc<dyn ConfigLookup>,
    sunset_env_key: String,
    features: FeatureMatrix,
}

impl std::fmt::Debug for VersionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionResolver")
            .field("supported", &self.supported)
            .field("deprecated", &self.deprecated)
            .field("sunset_env_key", &self.sunset_env_key)
            .finish_non_exhaustive()
    }
}

impl VersionResolver {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> VersionResolverBuilder {
        VersionResolverBuilder::default()
    }

    /// Adds a supported version. Registering an existing version is a no-op.
    pub fn register_version(&mut self, version: &str) -> Result<(), VersionError> {
        validate_tag(version)?;
        if !self.is_supported(version) {
            self.supported.push(version.to_string());
        }
        Ok(())
    }

    /// Marks a supported version deprecated, with an optional sunset date.
    pub fn deprecate(&mut self, version: &str, sunset_date: Option<&str>) -> Result<(), VersionError> {
        if !self.is_supported(version) {
            return Err(VersionError::Unsupported(version.to_string()));
        }
        let sunset = sunset_date
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self.deprecated.insert(version.to_string(), sunset);
        Ok(())
    }

    /// Returns `true` if the version is supported.
    #[must_use]
    pub fn is_supported(&self, version: &str) -> bool {
        self.supported.iter().any(|v| v == version)
    }

    /// Returns `true` if the version is deprecated.
    #[must_use]
    pub fn is_deprecated(&self, version: &str) -> bool {
        self.deprecated.contains_key(version)
    }

    /// Returns the default (first supported) version.
    #[must_use]
    pub fn default_version(&self) -> &str {
        // build() guarantees at least one entry
        self.supported.first().map_or("v1", String::as_str)
    }

    /// Returns the latest (last supported) version.
    #[must_use]
    pub fn latest_version(&self) -> &str {
        self.supported.last().map_or("v1", String::as_str)
    }

    /// Returns the supported versions in registration order.
    #[must_use]
    pub fn supported_versions(&self) -> &[String] {
        &self.supported
    }

    /// Resolves the version of a request.
    ///
    /// Order: a `/vN/` path prefix naming a supported version, then the
    /// `Accept-Version` header, then the default version. Unsupported
    /// candidates fall through silently.
    pub fn resolve(&self, path: &str, headers: &HeaderMap) -> VersionContext {
        let from_path = path_version(path).filter(|v| self.is_supported(v));
        let version = from_path
            .or_else(|| header_version(headers).filter(|v| self.is_supported(v)))
            .unwrap_or_else(|| self.default_version().to_string());

        tracing::debug!(path = %path, api_version = %version, "resolved API version");

        let is_deprecated = self.is_deprecated(&version);
        let sunset_date = if is_deprecated {
            self.sunset_for(&version)
        } else {
            None
        };

        VersionContext {
            version,
            is_deprecated,
            sunset_date,
        }
    }

    /// Builds the version headers for a response.
    ///
    /// `X-API-Version` and `X-API-Latest-Version` are always present. A
    /// deprecated version adds `X-API-Deprecated`, `X-API-Sunset-Date` and a
    /// `Warning: 299` header pointing at the latest version.
    #[must_use]
    pub fn deprecation_headers(&self, version: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let latest = self.latest_version();

        insert(&mut headers, API_VERSION_HEADER, version);
        insert(&mut headers, API_LATEST_VERSION_HEADER, latest);

        if self.is_deprecated(version) {
            let sunset = self
                .sunset_for(version)
                .unwrap_or_else(|| UNKNOWN_SUNSET.to_string());
            insert(&mut headers, API_DEPRECATED_HEADER, "true");
            insert(&mut headers, API_SUNSET_DATE_HEADER, &sunset);

            let warning = format!(
                "299 - \"API version {version} is deprecated. Please migrate to {latest}\""
            );
            if let Ok(value) = HeaderValue::from_str(&warning) {
                headers.insert(WARNING, value);
            }
        }

        headers
    }

    /// Returns `true` if `version` (or the default when `None`) exposes `feature`.
    #[must_use]
    pub fn supports(&self, feature: &str, version: Option<&str>) -> bool {
        let version = version.unwrap_or_else(|| self.default_version());
        self.features.supports(version, feature)
    }

    /// Returns the feature matrix.
    #[must_use]
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    fn sunset_for(&self, version: &str) -> Option<String> {
        self.deprecated
            .get(version)
            .cloned()
            .flatten()
            .or_else(|| self.lookup.get(&self.sunset_env_key))
    }
}

/// Builder for [`VersionResolver`].
pub struct VersionResolverBuilder {
    supported: Vec<String>,
    deprecated: Vec<(String, Option<String>)>,
    lookup: Arc<dyn ConfigLookup>,
    sunset_env_key: String,
    features: FeatureMatrix,
}

impl Default for VersionResolverBuilder {
    fn default() -> Self {
        Self {
            supported: Vec::new(),
            deprecated: Vec::new(),
            lookup: Arc::new(EnvLookup),
            sunset_env_key: DEFAULT_SUNSET_ENV_KEY.to_string(),
            features: FeatureMatrix::standard(),
        }
    }
}

impl VersionResolverBuilder {
    /// Appends supported versions; the first ever added is the default.
    #[must_use]
    pub fn supported<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported.extend(versions.into_iter().map(Into::into));
        self
    }

    /// Marks a version deprecated.
    #[must_use]
    pub fn deprecate(mut self, version: impl Into<String>, sunset_date: Option<&str>) -> Self {
        self.deprecated
            .push((version.into(), sunset_date.map(str::to_string)));
        self
    }

    /// Sets the configuration lookup used for the sunset fallback.
    #[must_use]
    pub fn lookup(mut self, lookup: Arc<dyn ConfigLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Sets the key consulted when a deprecated version has no recorded sunset date.
    #[must_use]
    pub fn sunset_env_key(mut self, key: impl Into<String>) -> Self {
        self.sunset_env_key = key.into();
        self
    }

    /// Replaces the feature matrix.
    #[must_use]
    pub fn features(mut self, features: FeatureMatrix) -> Self {
        self.features = features;
        self
    }

    /// Builds the resolver, validating every tag.
    pub fn build(self) -> Result<VersionResolver, VersionError> {
        if self.supported.is_empty() {
            return Err(VersionError::NoVersions);
        }

        let mut resolver = VersionResolver {
            supported: Vec::with_capacity(self.supported.len()),
            deprecated: IndexMap::new(),
            lookup: self.lookup,
            sunset_env_key: self.sunset_env_key,
            features: self.features,
        };

        for version in &self.supported {
            resolver.register_version(version)?;
        }
        for (version, sunset) in &self.deprecated {
            resolver.deprecate(version, sunset.as_deref())?;
        }

        Ok(resolver)
    }
}

/// Removes any leading `/api/vN/` or `/vN/` prefix, collapsing it to `/`.
///
/// Stripping repeats until no prefix remains, so applying it twice is the
/// same as applying it once.
///
/// ```
/// use farmgate_versioning::strip_version_prefix;
///
/// assert_eq!(strip_version_prefix("/api/v2/orders"), "/orders");
/// assert_eq!(strip_version_prefix("/v1/v2/orders"), "/orders");
/// assert_eq!(strip_version_prefix("/health"), "/health");
/// ```
#[must_use]
pub fn strip_version_prefix(path: &str) -> String {
    let mut rest = path;
    loop {
        let len = prefix_len(rest, "/api/v").or_else(|| prefix_len(rest, "/v"));
        match len {
            Some(len) => rest = &rest[len..],
            None => break,
        }
    }
    rest.to_string()
}

/// Length of `lead` + digits, if followed by `/`. The slash is not counted.
fn prefix_len(path: &str, lead: &str) -> Option<usize> {
    let after = path.strip_prefix(lead)?;
    let digits = after.bytes().take_while(u8::is_ascii_digit).count();
    (digits > 0 && after.as_bytes().get(digits) == Some(&b'/')).then_some(lead.len() + digits)
}

fn path_version(path: &str) -> Option<String> {
    prefix_len(path, "/v").map(|len| path[1..len].to_string())
}

fn header_version(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(ACCEPT_VERSION_HEADER)?.to_str().ok()?.trim();
    let digits = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then(|| format!("v{digits}"))
}

/// Checks that a tag has the form `v<digits>`.
pub fn validate_tag(version: &str) -> Result<(), VersionError> {
    let valid = version
        .strip_prefix('v')
        .is_some_and(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(VersionError::InvalidTag(version.to_string()))
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(_) => tracing::warn!(header = name, "dropping header with invalid value"),
    }
}

//! # Farmgate Versioning
//!
//! API version resolution for the Farmgate dispatch core.
//!
//! A [`VersionResolver`] decides which API version a request targets (path
//! prefix, then `Accept-Version` header, then the default), strips the version
//! prefix before route matching, and produces the deprecation headers attached
//! to every response.
//!
//! ```
//! use farmgate_versioning::{strip_version_prefix, VersionResolver};
//! use http::HeaderMap;
//!
//! let resolver = VersionResolver::builder()
//!     .supported(["v1", "v2"])
//!     .deprecate("v1", Some("2027-06-30"))
//!     .build()
//!     .unwrap();
//!
//! let ctx = resolver.resolve("/v1/users/42", &HeaderMap::new());
//! assert_eq!(ctx.version, "v1");
//! assert!(ctx.is_deprecated);
//! assert_eq!(strip_version_prefix("/v1/users/42"), "/users/42");
//! ```

#![doc(html_root_url = "https://docs.rs/farmgate-versioning/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod features;
mod resolver;

pub use farmgate_core::VersionContext;
pub use features::{feature, FeatureMatrix};
pub use resolver::{
    strip_version_prefix, validate_tag, VersionError, VersionResolver, VersionResolverBuilder,
    ACCEPT_VERSION_HEADER, API_DEPRECATED_HEADER, API_LATEST_VERSION_HEADER,
    API_SUNSET_DATE_HEADER, API_VERSION_HEADER,
};

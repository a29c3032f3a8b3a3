//! Route registration errors.

use farmgate_middleware::MiddlewareError;
use thiserror::Error;

/// Errors raised while registering a route.
///
/// The offending route is skipped; the rest of the table still builds.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Path template could not be compiled.
    #[error("invalid route pattern '{template}': {reason}")]
    InvalidPattern {
        /// The template as registered.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A middleware tag did not resolve.
    #[error("route {method} {path}: invalid middleware '{tag}': {source}")]
    InvalidMiddleware {
        /// Route method.
        method: String,
        /// Route path.
        path: String,
        /// The tag that failed.
        tag: String,
        /// Why it failed.
        #[source]
        source: MiddlewareError,
    },
}

impl RouteError {
    pub(crate) fn pattern(template: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

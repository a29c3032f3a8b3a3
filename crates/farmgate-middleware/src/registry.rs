//! Name-to-middleware resolution.

use crate::error::MiddlewareError;
use crate::middleware::BoxedMiddleware;
use crate::spec::MiddlewareSpec;
use crate::stages::{PermissionMiddleware, PermissionRequirement, RequireAuthentication, ScopeMiddleware};
use farmgate_core::{JsonEmitter, ResponseEmitter};
use std::collections::HashMap;
use std::sync::Arc;

/// Name under which [`MiddlewareRegistry::standard`] registers the authentication gate.
pub const AUTH_MIDDLEWARE: &str = "auth";

/// Resolves middleware tags to middleware instances.
///
/// Named middleware is registered up front; guard specs (`permission:*`,
/// `scope:*`) are built on demand.
///
/// ```
/// use farmgate_middleware::{MiddlewareRegistry, MiddlewareError};
///
/// let registry = MiddlewareRegistry::standard();
/// assert!(registry.resolve_tag("auth").is_ok());
/// assert!(registry.resolve_tag("permission:users:read").is_ok());
/// assert_eq!(
///     registry.resolve_tag("teleport").err(),
///     Some(MiddlewareError::Unknown("teleport".into()))
/// );
/// ```
pub struct MiddlewareRegistry {
    named: HashMap<String, BoxedMiddleware>,
    emitter: Arc<dyn ResponseEmitter>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry rendering guard rejections with [`JsonEmitter`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_emitter(Arc::new(JsonEmitter))
    }

    /// Creates an empty registry with a custom emitter.
    #[must_use]
    pub fn with_emitter(emitter: Arc<dyn ResponseEmitter>) -> Self {
        Self {
            named: HashMap::new(),
            emitter,
        }
    }

    /// Creates a registry with the authentication gate registered as `auth`.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let gate = RequireAuthentication::new(AUTH_MIDDLEWARE, Arc::clone(&registry.emitter));
        registry.register(AUTH_MIDDLEWARE, Arc::new(gate));
        registry
    }

    /// Registers (or replaces) named middleware.
    pub fn register(&mut self, name: impl Into<String>, middleware: BoxedMiddleware) {
        self.named.insert(name.into(), middleware);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, middleware: BoxedMiddleware) -> Self {
        self.register(name, middleware);
        self
    }

    /// Returns `true` if a middleware is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Returns the registered middleware names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.named.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the emitter guards render with.
    #[must_use]
    pub fn emitter(&self) -> &Arc<dyn ResponseEmitter> {
        &self.emitter
    }

    /// Resolves a parsed spec.
    pub fn resolve(&self, spec: &MiddlewareSpec) -> Result<BoxedMiddleware, MiddlewareError> {
        let tag = spec.to_string();
        let emitter = Arc::clone(&self.emitter);

        let middleware: BoxedMiddleware = match spec {
            MiddlewareSpec::Named(name) => {
                return self
                    .named
                    .get(name)
                    .cloned()
                    .ok_or_else(|| MiddlewareError::Unknown(name.clone()));
            }
            MiddlewareSpec::Permission(p) => Arc::new(PermissionMiddleware::new(
                tag,
                PermissionRequirement::One(p.clone()),
                emitter,
            )),
            MiddlewareSpec::PermissionAny(ps) => Arc::new(PermissionMiddleware::new(
                tag,
                PermissionRequirement::Any(ps.clone()),
                emitter,
            )),
            MiddlewareSpec::PermissionAll(ps) => Arc::new(PermissionMiddleware::new(
                tag,
                PermissionRequirement::All(ps.clone()),
                emitter,
            )),
            MiddlewareSpec::Scope(s) => Arc::new(ScopeMiddleware::new(tag, s.clone(), emitter)),
        };
        Ok(middleware)
    }

    /// Parses and resolves a tag.
    pub fn resolve_tag(&self, tag: &str) -> Result<BoxedMiddleware, MiddlewareError> {
        self.resolve(&MiddlewareSpec::parse(tag)?)
    }
}

impl Default for MiddlewareRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("named", &self.names())
            .finish_non_exhaustive()
    }
}

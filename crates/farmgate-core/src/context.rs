//! Per-request context.
//!
//! Everything that used to be process-wide mutable state (current version,
//! current route, authenticated caller) is carried here and dropped with the
//! response.

use crate::method::HttpMethod;
use crate::trace::TraceIdentifiers;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// The API version a request was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionContext {
    /// Version tag, e.g. `v1`.
    pub version: String,
    /// Whether the version is marked deprecated.
    pub is_deprecated: bool,
    /// Recorded sunset date for deprecated versions.
    pub sunset_date: Option<String>,
}

impl VersionContext {
    /// Creates a non-deprecated version context.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            is_deprecated: false,
            sunset_date: None,
        }
    }
}

/// The route a request matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    /// Registered method.
    pub method: HttpMethod,
    /// Registered path template, e.g. `/users/{id}`.
    pub template: String,
}

/// An authenticated caller.
///
/// Authentication middleware installs a principal on the context; the
/// permission and scope guards read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Subject identifier.
    pub subject: String,
    /// Granted permissions, e.g. `users:read`.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Granted OAuth-style scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Principal {
    /// Creates a principal with no grants.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            permissions: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Adds a permission grant.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Adds a scope grant.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Returns `true` if any grant covers `permission`.
    ///
    /// A grant of `*` covers everything; a grant ending in `:*` covers every
    /// permission sharing its prefix (`users:*` covers `users:read`).
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|grant| {
            grant == "*"
                || grant == permission
                || grant
                    .strip_suffix('*')
                    .filter(|prefix| prefix.ends_with(':'))
                    .is_some_and(|prefix| permission.starts_with(prefix))
        })
    }

    /// Returns `true` if the scope was granted.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Request-scoped state shared between middleware and the handler.
///
/// # Example
///
/// ```
/// use farmgate_core::RequestContext;
///
/// let mut ctx = RequestContext::new();
/// ctx.insert_extension(42_u32);
/// assert_eq!(ctx.extension::<u32>(), Some(&42));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace: TraceIdentifiers,
    version: Option<VersionContext>,
    route: Option<MatchedRoute>,
    is_public: bool,
    principal: Option<Principal>,
    started_at: Instant,
    extensions: http::Extensions,
}

impl RequestContext {
    /// Creates a context with fresh trace identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_trace(TraceIdentifiers::generate())
    }

    /// Creates a context with the given trace identifiers.
    #[must_use]
    pub fn with_trace(trace: TraceIdentifiers) -> Self {
        Self {
            trace,
            version: None,
            route: None,
            is_public: false,
            principal: None,
            started_at: Instant::now(),
            extensions: http::Extensions::new(),
        }
    }

    /// Returns the trace identifiers.
    #[must_use]
    pub fn trace(&self) -> &TraceIdentifiers {
        &self.trace
    }

    /// Returns the resolved version, once set by the dispatcher.
    #[must_use]
    pub fn version(&self) -> Option<&VersionContext> {
        self.version.as_ref()
    }

    /// Sets the resolved version.
    pub fn set_version(&mut self, version: VersionContext) {
        self.version = Some(version);
    }

    /// Builder form of [`set_version`](Self::set_version).
    #[must_use]
    pub fn with_version(mut self, version: VersionContext) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns the matched route.
    #[must_use]
    pub fn route(&self) -> Option<&MatchedRoute> {
        self.route.as_ref()
    }

    /// Records the matched route and whether it is public.
    pub fn set_route(&mut self, route: MatchedRoute, is_public: bool) {
        self.route = Some(route);
        self.is_public = is_public;
    }

    /// Returns `true` if the matched route skips authentication.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// Returns the authenticated caller.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Installs the authenticated caller.
    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    /// Builder form of [`set_principal`](Self::set_principal).
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, returning any previous value of that type.
    pub fn insert_extension<T>(&mut self, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value)
    }

    /// Returns a typed extension value.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Removes a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions.remove::<T>()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_wildcards() {
        let p = Principal::new("u1")
            .with_permission("users:*")
            .with_permission("reports:read");

        assert!(p.has_permission("users:read"));
        assert!(p.has_permission("users:delete"));
        assert!(p.has_permission("reports:read"));
        assert!(!p.has_permission("reports:write"));
        assert!(!p.has_permission("usersx"));

        let admin = Principal::new("root").with_permission("*");
        assert!(admin.has_permission("anything:at:all"));
    }

    #[test]
    fn test_scopes() {
        let p = Principal::new("svc").with_scope("read:orders");
        assert!(p.has_scope("read:orders"));
        assert!(!p.has_scope("write:orders"));
    }

    #[test]
    fn test_extensions_are_typed() {
        #[derive(Clone, Debug, PartialEq)]
        struct Tenant(String);

        let mut ctx = RequestContext::new();
        assert!(ctx.extension::<Tenant>().is_none());

        ctx.insert_extension(Tenant("acme".into()));
        assert_eq!(ctx.extension::<Tenant>(), Some(&Tenant("acme".into())));

        let cloned = ctx.clone();
        assert_eq!(cloned.extension::<Tenant>(), Some(&Tenant("acme".into())));

        assert_eq!(ctx.remove_extension::<Tenant>(), Some(Tenant("acme".into())));
        assert!(ctx.extension::<Tenant>().is_none());
    }

    #[test]
    fn test_route_and_version() {
        let mut ctx = RequestContext::new().with_version(VersionContext::new("v2"));
        ctx.set_route(
            MatchedRoute {
                method: HttpMethod::Get,
                template: "/health".into(),
            },
            true,
        );
        assert_eq!(ctx.version().unwrap().version, "v2");
        assert!(ctx.is_public());
        assert_eq!(ctx.route().unwrap().template, "/health");
    }
}

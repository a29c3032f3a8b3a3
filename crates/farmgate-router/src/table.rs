//! Route table construction and lookup.
//!
//! Routes are registered through a [`RouteTableBuilder`] at bootstrap and
//! frozen into an immutable [`RouteTable`]. Lookup is a linear scan in
//! registration order; the first matching route wins.

use crate::error::RouteError;
use crate::pattern::{normalize_path, RoutePattern};
use crate::route::{Route, RouteMatch};
use farmgate_core::{BoxedHandler, Handler, HttpMethod};
use farmgate_middleware::{BoxedMiddleware, MiddlewareChain, MiddlewareRegistry, MiddlewareSpec};
use std::sync::Arc;

/// An immutable set of compiled routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Finds the first route registered for `method` whose pattern matches `path`.
    ///
    /// `path` must already have its version prefix stripped.
    #[must_use]
    pub fn find(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route
                    .pattern
                    .matches(path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    /// Returns the methods that have a route matching `path`.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<HttpMethod> {
        let mut methods: Vec<HttpMethod> = self
            .routes
            .iter()
            .filter(|route| route.pattern.matches(path).is_some())
            .map(|route| route.method)
            .collect();
        methods.sort_unstable();
        methods.dedup();
        methods
    }

    /// Returns the routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if there are no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

struct GroupScope {
    prefix: String,
    middleware: Vec<String>,
}

struct PendingRoute {
    route: Route,
    middleware: Vec<BoxedMiddleware>,
}

/// Builds a [`RouteTable`].
///
/// ```
/// use farmgate_core::{handler_fn, HttpMethod, JsonEmitter, ResponseEmitter};
/// use farmgate_middleware::MiddlewareRegistry;
/// use farmgate_router::RouteTableBuilder;
/// use std::sync::Arc;
///
/// let ok = || handler_fn(|_ctx, _req, _params| async {
///     Ok(JsonEmitter.success("ok", serde_json::Value::Null, http::StatusCode::OK))
/// });
///
/// let mut builder = RouteTableBuilder::new(Arc::new(MiddlewareRegistry::standard()));
/// builder.get("/health", ok(), &[], true).unwrap();
/// builder.group("/admin", &["auth"], |admin| {
///     admin.get("/users/{id}", ok(), &["permission:users:read"], false)
/// }).unwrap();
///
/// let table = builder.build();
/// let found = table.find(HttpMethod::Get, "/admin/users/7").unwrap();
/// assert_eq!(found.param("id"), Some("7"));
/// assert_eq!(found.route.middleware_names(), &["auth", "permission:users:read"]);
/// ```
pub struct RouteTableBuilder {
    registry: Arc<MiddlewareRegistry>,
    global: Vec<BoxedMiddleware>,
    scopes: Vec<GroupScope>,
    routes: Vec<PendingRoute>,
}

impl RouteTableBuilder {
    /// Creates a builder resolving middleware through `registry`.
    #[must_use]
    pub fn new(registry: Arc<MiddlewareRegistry>) -> Self {
        Self {
            registry,
            global: Vec::new(),
            scopes: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Returns the middleware registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<MiddlewareRegistry> {
        &self.registry
    }

    /// Appends global middleware by tag. Globals run before every route's own middleware.
    pub fn global(&mut self, tag: &str) -> Result<(), RouteError> {
        let middleware = self
            .registry
            .resolve_tag(tag)
            .map_err(|source| RouteError::InvalidMiddleware {
                method: "*".to_string(),
                path: "*".to_string(),
                tag: tag.to_string(),
                source,
            })?;
        self.global.push(middleware);
        Ok(())
    }

    /// Appends a global middleware instance.
    pub fn global_middleware(&mut self, middleware: BoxedMiddleware) {
        self.global.push(middleware);
    }

    /// Runs `body` with a group scope pushed.
    ///
    /// Routes added inside get `prefix` prepended and `middleware` run before
    /// their own. Groups nest; outer groups come first.
    pub fn group<R>(
        &mut self,
        prefix: &str,
        middleware: &[&str],
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.scopes.push(GroupScope {
            prefix: prefix.to_string(),
            middleware: middleware.iter().map(|m| (*m).to_string()).collect(),
        });
        let result = body(self);
        self.scopes.pop();
        result
    }

    /// Registers a route.
    ///
    /// Group prefixes are prepended to `path` and group middleware is placed
    /// before `middleware`. A tag that fails to parse or resolve skips the
    /// route. Registering the same method and path twice replaces the first
    /// route in place.
    pub fn add_route(
        &mut self,
        method: HttpMethod,
        path: &str,
        handler: BoxedHandler,
        middleware: &[&str],
        is_public: bool,
    ) -> Result<(), RouteError> {
        let full_path = self.scoped_path(path);
        let names: Vec<String> = self
            .scopes
            .iter()
            .flat_map(|scope| scope.middleware.iter().cloned())
            .chain(middleware.iter().map(|m| (*m).to_string()))
            .collect();

        let mut resolved = Vec::with_capacity(names.len());
        for tag in &names {
            let result = MiddlewareSpec::parse(tag).and_then(|spec| self.registry.resolve(&spec));
            match result {
                Ok(mw) => resolved.push(mw),
                Err(source) => {
                    tracing::warn!(
                        method = %method,
                        path = %full_path,
                        middleware = %tag,
                        error = %source,
                        "skipping route with invalid middleware"
                    );
                    return Err(RouteError::InvalidMiddleware {
                        method: method.to_string(),
                        path: full_path,
                        tag: tag.clone(),
                        source,
                    });
                }
            }
        }

        let pattern = RoutePattern::compile(&full_path).map_err(|e| {
            tracing::warn!(method = %method, path = %full_path, error = %e, "skipping route");
            e
        })?;

        let pending = PendingRoute {
            route: Route {
                method,
                pattern,
                handler,
                middleware_names: names,
                is_public,
                chain: MiddlewareChain::new(),
            },
            middleware: resolved,
        };

        let existing = self.routes.iter().position(|p| {
            p.route.method == method && p.route.path() == pending.route.path()
        });
        match existing {
            Some(index) => {
                tracing::warn!(
                    method = %method,
                    path = %pending.route.path(),
                    "duplicate route registration, replacing earlier route"
                );
                self.routes[index] = pending;
            }
            None => {
                tracing::debug!(method = %method, path = %pending.route.path(), "registered route");
                self.routes.push(pending);
            }
        }
        Ok(())
    }

    /// Registers a `GET` route.
    pub fn get(
        &mut self,
        path: &str,
        handler: impl Handler,
        middleware: &[&str],
        is_public: bool,
    ) -> Result<(), RouteError> {
        self.add_route(HttpMethod::Get, path, Arc::new(handler), middleware, is_public)
    }

    /// Registers a `POST` route.
    pub fn post(
        &mut self,
        path: &str,
        handler: impl Handler,
        middleware: &[&str],
        is_public: bool,
    ) -> Result<(), RouteError> {
        self.add_route(HttpMethod::Post, path, Arc::new(handler), middleware, is_public)
    }

    /// Registers a `PUT` route.
    pub fn put(
        &mut self,
        path: &str,
        handler: impl Handler,
        middleware: &[&str],
        is_public: bool,
    ) -> Result<(), RouteError> {
        self.add_route(HttpMethod::Put, path, Arc::new(handler), middleware, is_public)
    }

    /// Registers a `DELETE` route.
    pub fn delete(
        &mut self,
        path: &str,
        handler: impl Handler,
        middleware: &[&str],
        is_public: bool,
    ) -> Result<(), RouteError> {
        self.add_route(HttpMethod::Delete, path, Arc::new(handler), middleware, is_public)
    }

    /// Returns the number of routes registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freezes the routes, composing each route's chain from the globals
    /// and its own middleware.
    #[must_use]
    pub fn build(self) -> RouteTable {
        let global = self.global;
        let routes = self
            .routes
            .into_iter()
            .map(|pending| {
                let mut route = pending.route;
                route.chain = MiddlewareChain::compose(&global, &pending.middleware, route.is_public);
                route
            })
            .collect();
        RouteTable { routes }
    }

    fn scoped_path(&self, path: &str) -> String {
        let joined = self
            .scopes
            .iter()
            .map(|scope| scope.prefix.as_str())
            .chain(std::iter::once(path))
            .map(|part| part.trim_matches('/'))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        normalize_path(&joined)
    }
}

impl std::fmt::Debug for RouteTableBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTableBuilder")
            .field("routes", &self.routes.len())
            .field("scopes", &self.scopes.len())
            .finish_non_exhaustive()
    }
}

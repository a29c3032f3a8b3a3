//! Compiled routes and match results.

use crate::pattern::RoutePattern;
use farmgate_core::{BoxedHandler, HttpMethod, MatchedRoute};
use farmgate_middleware::MiddlewareChain;
use indexmap::IndexMap;

/// A registered endpoint with its precomputed middleware chain.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) method: HttpMethod,
    pub(crate) pattern: RoutePattern,
    pub(crate) handler: BoxedHandler,
    pub(crate) middleware_names: Vec<String>,
    pub(crate) is_public: bool,
    pub(crate) chain: MiddlewareChain,
}

impl Route {
    /// Returns the route method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the full path template (group prefixes included).
    #[must_use]
    pub fn path(&self) -> &str {
        self.pattern.template()
    }

    /// Returns the compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Returns the group and route middleware tags, outer groups first.
    #[must_use]
    pub fn middleware_names(&self) -> &[String] {
        &self.middleware_names
    }

    /// Returns `true` if the route skips authentication middleware.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// Returns the full chain (global, group, route) run for this route.
    #[must_use]
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    pub(crate) fn matched(&self) -> MatchedRoute {
        MatchedRoute {
            method: self.method,
            template: self.path().to_string(),
        }
    }
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The matched route.
    pub route: &'a Route,
    /// Extracted path parameters, in template order.
    pub params: IndexMap<String, String>,
}

impl RouteMatch<'_> {
    /// Returns a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the parameter values in template order.
    #[must_use]
    pub fn positional(&self) -> Vec<String> {
        self.params.values().cloned().collect()
    }
}

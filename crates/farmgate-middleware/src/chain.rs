//! Ordered middleware chains.
//!
//! A chain is composed once, when the route table is built: global middleware
//! first, then group middleware (outermost group first), then the route's own
//! middleware. At dispatch time the chain runs onion-style, so the first
//! middleware sees the request first and the response last.

use crate::middleware::{BoxedMiddleware, Endpoint, Next};
use farmgate_core::{Request, RequestContext, Response};

/// An immutable, ordered list of middleware.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stack: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes a chain from global and route-level middleware.
    ///
    /// When `is_public` is set, authentication middleware is left out.
    #[must_use]
    pub fn compose<'a, G, R>(global: G, route: R, is_public: bool) -> Self
    where
        G: IntoIterator<Item = &'a BoxedMiddleware>,
        R: IntoIterator<Item = &'a BoxedMiddleware>,
    {
        let stack = global
            .into_iter()
            .chain(route)
            .filter(|mw| !(is_public && mw.is_authentication()))
            .cloned()
            .collect();
        Self { stack }
    }

    /// Appends a middleware.
    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.stack.push(middleware);
    }

    /// Returns the number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Returns middleware names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stack.iter().map(|mw| mw.name()).collect()
    }

    /// Runs the chain, ending at `endpoint`.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        request: Request,
        endpoint: &dyn Endpoint,
    ) -> Response {
        Next::new(&self.stack, endpoint).run(ctx, request).await
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl FromIterator<BoxedMiddleware> for MiddlewareChain {
    fn from_iter<I: IntoIterator<Item = BoxedMiddleware>>(iter: I) -> Self {
        Self {
            stack: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{FnEndpoint, FnMiddleware, Middleware};
    use farmgate_core::{BoxFuture, HttpMethod, JsonEmitter, ResponseEmitter};
    use http::StatusCode;
    use std::sync::Arc;

    struct Named {
        name: &'static str,
        auth: bool,
    }

    impl Middleware for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn is_authentication(&self) -> bool {
            self.auth
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(next.run(ctx, request))
        }
    }

    fn named(name: &'static str, auth: bool) -> BoxedMiddleware {
        Arc::new(Named { name, auth })
    }

    #[test]
    fn test_compose_order_and_public_filter() {
        let global = vec![named("cors", false), named("auth", true)];
        let route = vec![named("audit", false)];

        let chain = MiddlewareChain::compose(&global, &route, false);
        assert_eq!(chain.names(), vec!["cors", "auth", "audit"]);

        let public = MiddlewareChain::compose(&global, &route, true);
        assert_eq!(public.names(), vec!["cors", "audit"]);
    }

    #[tokio::test]
    async fn test_run_reaches_endpoint() {
        let endpoint = FnEndpoint::new(|ctx, _req| {
            let seen = ctx.extension::<&'static str>().copied();
            Box::pin(async move {
                JsonEmitter.success("ok", serde_json::json!({ "seen": seen }), StatusCode::OK)
            })
        });

        let mark: BoxedMiddleware = Arc::new(FnMiddleware::new("mark", |ctx, req, next| {
            Box::pin(async move {
                ctx.insert_extension("marked");
                next.run(ctx, req).await
            })
        }));

        let chain: MiddlewareChain = [mark].into_iter().collect();
        let mut ctx = RequestContext::new();
        let res = chain
            .run(&mut ctx, Request::new(HttpMethod::Get, "/"), &endpoint)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(ctx.extension::<&'static str>(), Some(&"marked"));
    }
}

//! Core middleware trait and the `Next` continuation.
//!
//! Middleware receives the mutable request context, the request and a
//! [`Next`] it may run to continue the chain. Not running `next` short-circuits
//! everything after it, including the endpoint.
//!
//! # Example
//!
//! ```
//! use farmgate_core::{BoxFuture, Request, RequestContext, Response};
//! use farmgate_middleware::{Middleware, Next};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed_ms = ctx.elapsed().as_millis() as u64, "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use farmgate_core::{BoxFuture, Request, RequestContext, Response};
use std::sync::Arc;

/// A shareable, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The middleware contract.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name used for logging and debugging.
    fn name(&self) -> &str;

    /// Returns `true` for authentication middleware, which public routes skip.
    fn is_authentication(&self) -> bool {
        false
    }

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The innermost element of a chain, usually the route handler.
pub trait Endpoint: Send + Sync {
    /// Produces the response.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request) -> BoxFuture<'a, Response>;
}

/// Continuation handed to each middleware.
///
/// `Next` is a cursor over the remaining middleware. Running it consumes it,
/// so the rest of the chain can run at most once.
pub struct Next<'a> {
    stack: &'a [BoxedMiddleware],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    /// Creates a continuation over `stack` that ends at `endpoint`.
    pub fn new(stack: &'a [BoxedMiddleware], endpoint: &'a dyn Endpoint) -> Self {
        Self { stack, endpoint }
    }

    /// Number of middleware still to run before the endpoint.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stack.len()
    }

    /// Runs the next middleware, or the endpoint when none remain.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.stack.split_first() {
            Some((middleware, rest)) => {
                let next = Next {
                    stack: rest,
                    endpoint: self.endpoint,
                };
                middleware.process(ctx, request, next).await
            }
            None => self.endpoint.call(ctx, request).await,
        }
    }
}

/// A middleware built from a closure.
///
/// ```
/// use farmgate_middleware::FnMiddleware;
///
/// let tag = FnMiddleware::new("tag", |ctx, req, next| {
///     Box::pin(async move {
///         ctx.insert_extension("tagged");
///         next.run(ctx, req).await
///     })
/// });
/// # let _ = tag;
/// ```
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    /// Wraps a closure under the given name.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}

/// An [`Endpoint`] built from a closure.
pub struct FnEndpoint<F> {
    func: F,
}

impl<F> FnEndpoint<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request) -> BoxFuture<'a, Response> + Send + Sync,
{
    /// Wraps a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Endpoint for FnEndpoint<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request) -> BoxFuture<'a, Response> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request)
    }
}

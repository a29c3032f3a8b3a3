//! Terminal handler contract.
//!
//! A handler is the innermost element of a middleware chain. It receives an
//! owned snapshot of the request context, the decoded request and the path
//! parameters in template order.

use crate::context::RequestContext;
use crate::error::DispatchResult;
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that is Send and can be stored.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shareable, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// The handler-invocation contract.
///
/// # Example
///
/// ```
/// use farmgate_core::{handler_fn, BoxedHandler, JsonEmitter, ResponseEmitter};
/// use std::sync::Arc;
///
/// let handler: BoxedHandler = Arc::new(handler_fn(|_ctx, _req, params| async move {
///     Ok(JsonEmitter.success("user_found", serde_json::json!({ "id": params[0] }), http::StatusCode::OK))
/// }));
/// # let _ = handler;
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(
        &self,
        ctx: RequestContext,
        request: Request,
        params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>>;
}

/// A closure-backed [`Handler`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Wraps a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext, Request, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<Response>> + Send + 'static,
{
    fn call(
        &self,
        ctx: RequestContext,
        request: Request,
        params: Vec<String>,
    ) -> BoxFuture<'static, DispatchResult<Response>> {
        Box::pin((self.func)(ctx, request, params))
    }
}

impl std::fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler")
    }
}

/// Creates a [`FnHandler`] from an async closure.
pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(RequestContext, Request, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<Response>> + Send + 'static,
{
    FnHandler::new(func)
}

//! Authentication gate.
//!
//! Credential verification lives outside the dispatch core; whatever verifies
//! credentials installs a [`Principal`](farmgate_core::Principal) on the
//! context before this stage runs. This stage only enforces that one is present,
//! and is marked as authentication so public routes skip it.

use crate::middleware::{Middleware, Next};
use farmgate_core::{BoxFuture, Request, RequestContext, Response, ResponseEmitter};
use http::StatusCode;
use std::sync::Arc;

/// Rejects requests without a principal with `401 UNAUTHORIZED`.
pub struct RequireAuthentication {
    name: String,
    emitter: Arc<dyn ResponseEmitter>,
}

impl RequireAuthentication {
    /// Message key used for rejections.
    pub const MESSAGE_KEY: &'static str = "unauthenticated";

    /// Creates the gate under the given name.
    pub fn new(name: impl Into<String>, emitter: Arc<dyn ResponseEmitter>) -> Self {
        Self {
            name: name.into(),
            emitter,
        }
    }
}

impl Middleware for RequireAuthentication {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_authentication(&self) -> bool {
        true
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if ctx.principal().is_none() {
                tracing::debug!(path = %request.path(), "rejecting unauthenticated request");
                return self
                    .emitter
                    .error(Self::MESSAGE_KEY, "UNAUTHORIZED", StatusCode::UNAUTHORIZED);
            }
            next.run(ctx, request).await
        })
    }
}

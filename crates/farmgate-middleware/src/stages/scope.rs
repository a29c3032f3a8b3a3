//! Scope guard.

use crate::middleware::{Middleware, Next};
use farmgate_core::{BoxFuture, Request, RequestContext, Response, ResponseEmitter};
use http::StatusCode;
use std::sync::Arc;

/// Answers `401` without a principal and `403` when the scope is missing.
pub struct ScopeMiddleware {
    name: String,
    scope: String,
    emitter: Arc<dyn ResponseEmitter>,
}

impl ScopeMiddleware {
    /// Creates a guard requiring `scope`.
    pub fn new(
        name: impl Into<String>,
        scope: impl Into<String>,
        emitter: Arc<dyn ResponseEmitter>,
    ) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            emitter,
        }
    }
}

impl Middleware for ScopeMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(principal) = ctx.principal() else {
                return self
                    .emitter
                    .error("unauthenticated", "UNAUTHORIZED", StatusCode::UNAUTHORIZED);
            };

            if !principal.has_scope(&self.scope) {
                tracing::info!(subject = %principal.subject, scope = %self.scope, "scope missing");
                return self
                    .emitter
                    .error("insufficient_scope", "FORBIDDEN", StatusCode::FORBIDDEN);
            }

            next.run(ctx, request).await
        })
    }
}

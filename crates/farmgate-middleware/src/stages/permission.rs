//! Permission guard.

use crate::middleware::{Middleware, Next};
use farmgate_core::{BoxFuture, Principal, Request, RequestContext, Response, ResponseEmitter};
use http::StatusCode;
use std::sync::Arc;

/// What a [`PermissionMiddleware`] requires of the principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRequirement {
    /// One permission.
    One(String),
    /// At least one of these.
    Any(Vec<String>),
    /// All of these.
    All(Vec<String>),
}

impl PermissionRequirement {
    /// Returns `true` if `principal` satisfies the requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, principal: &Principal) -> bool {
        match self {
            Self::One(p) => principal.has_permission(p),
            Self::Any(ps) => ps.iter().any(|p| principal.has_permission(p)),
            Self::All(ps) => ps.iter().all(|p| principal.has_permission(p)),
        }
    }
}

/// Answers `401` without a principal and `403` when the requirement fails.
pub struct PermissionMiddleware {
    name: String,
    requirement: PermissionRequirement,
    emitter: Arc<dyn ResponseEmitter>,
}

impl PermissionMiddleware {
    /// Message key used for `403` rejections.
    pub const MESSAGE_KEY: &'static str = "insufficient_permissions";

    /// Creates a guard.
    pub fn new(
        name: impl Into<String>,
        requirement: PermissionRequirement,
        emitter: Arc<dyn ResponseEmitter>,
    ) -> Self {
        Self {
            name: name.into(),
            requirement,
            emitter,
        }
    }

    /// Returns the requirement.
    #[must_use]
    pub fn requirement(&self) -> &PermissionRequirement {
        &self.requirement
    }
}

impl Middleware for PermissionMiddleware {
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

            if !self.requirement.is_satisfied_by(principal) {
                tracing::info!(
                    subject = %principal.subject,
                    guard = %self.name,
                    path = %request.path(),
                    "permission denied"
                );
                return self
                    .emitter
                    .error(Self::MESSAGE_KEY, "FORBIDDEN", StatusCode::FORBIDDEN);
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements() {
        let p = Principal::new("u").with_permission("users:read");

        assert!(PermissionRequirement::One("users:read".into()).is_satisfied_by(&p));
        assert!(!PermissionRequirement::One("users:write".into()).is_satisfied_by(&p));
        assert!(
            PermissionRequirement::Any(vec!["users:write".into(), "users:read".into()])
                .is_satisfied_by(&p)
        );
        assert!(
            !PermissionRequirement::All(vec!["users:write".into(), "users:read".into()])
                .is_satisfied_by(&p)
        );
    }
}

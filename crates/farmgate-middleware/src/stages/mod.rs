//! Built-in middleware stages.
//!
//! - [`authentication`] - rejects requests with no authenticated principal
//! - [`permission`] - checks permission grants on the principal
//! - [`scope`] - checks scope grants on the principal
//!
//! Guards render their rejections through the registry's response emitter.

pub mod authentication;
pub mod permission;
pub mod scope;

pub use authentication::RequireAuthentication;
pub use permission::{PermissionMiddleware, PermissionRequirement};
pub use scope::ScopeMiddleware;

//! # Farmgate Discovery
//!
//! Controller route discovery for the Farmgate dispatch core.
//!
//! Controllers describe their routes through the [`Controller`] trait and
//! are listed in a [`ControllerCatalog`]. A [`ControllerRegistry`] turns the
//! registered controllers into [`RouteDefinition`]s, caches them in two tiers
//! keyed by source file modification time, and binds them to a
//! [`RouteTableBuilder`](farmgate_router::RouteTableBuilder).
//!
//! # Example
//!
//! ```
//! use farmgate_core::{BoxFuture, DispatchResult, JsonEmitter, RequestContext, Response, ResponseEmitter};
//! use farmgate_discovery::{
//!     ActionMeta, ActionPayload, Controller, ControllerCatalog, ControllerDescriptor,
//!     ControllerMetadata, ControllerRegistry, RouteGroup,
//! };
//! use farmgate_middleware::MiddlewareRegistry;
//! use farmgate_router::RouteTableBuilder;
//! use std::sync::Arc;
//!
//! struct Health;
//!
//! impl Controller for Health {
//!     fn metadata() -> ControllerMetadata {
//!         ControllerMetadata::new(RouteGroup::new("/health"))
//!             .action(ActionMeta::get("check", "/").public())
//!     }
//!
//!     fn construct() -> anyhow::Result<Self> {
//!         Ok(Self)
//!     }
//!
//!     fn call(
//!         self: Arc<Self>,
//!         _action: &str,
//!         _ctx: RequestContext,
//!         _input: ActionPayload,
//!         _params: Vec<String>,
//!     ) -> BoxFuture<'static, DispatchResult<Response>> {
//!         Box::pin(async { Ok(JsonEmitter.success("ok", serde_json::Value::Null, http::StatusCode::OK)) })
//!     }
//! }
//!
//! let catalog = ControllerCatalog::new()
//!     .with(ControllerDescriptor::of::<Health>("health_controller", file!()));
//! let mut registry = ControllerRegistry::new(Arc::new(catalog));
//! registry.register("health_controller");
//!
//! let routes = registry.discover_routes();
//! let mut builder = RouteTableBuilder::new(Arc::new(MiddlewareRegistry::standard()));
//! assert_eq!(registry.register_with_router(&routes, &mut builder), 1);
//! assert_eq!(builder.build().routes()[0].path(), "/health");
//! ```

#![doc(html_root_url = "https://docs.rs/farmgate-discovery/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
mod catalog;
mod controller;
mod definition;
mod error;
mod handler;
mod inventory;
mod registry;
mod scan;

pub use cache::{CacheInvalidation, CacheStore, FileCache, LocalCache, NullCache, RouteCacheEntry};
pub use catalog::{ControllerCatalog, ControllerDescriptor};
pub use controller::{
    ActionInput, ActionMeta, ActionPayload, Controller, ControllerMetadata, RouteGroup,
};
pub use definition::{HandlerRef, RouteDefinition};
pub use error::{CacheError, DiscoveryError};
pub use handler::ActionHandler;
pub use inventory::RouteInventory;
pub use registry::{
    CacheTier, ControllerRegistry, Discovery, DiscoveryOutcome, DiscoverySettings,
    DEFAULT_CACHE_KEY,
};

//! # Farmgate
//!
//! **Request dispatch core for hand-rolled HTTP services**
//!
//! Farmgate turns an incoming request into a resolved, middleware-wrapped
//! call to application code:
//!
//! - **Routing** – `{name}` templates, groups, first registered match wins
//! - **Discovery** – controllers describe their routes; snapshots are cached
//!   in two tiers and invalidated by source modification time
//! - **Versioning** – `/vN/` and `Accept-Version` resolution with deprecation headers
//! - **Trace identifiers** – ULID correlation, transaction and request IDs
//!
//! ## Quick Start
//!
//! ```
//! # tokio_test::block_on(async {
//! use farmgate::prelude::*;
//! use bytes::Bytes;
//! use http::{HeaderMap, Method, StatusCode};
//!
//! let app = Application::bootstrap(
//!     FarmgateConfig::default(),
//!     ControllerCatalog::new(),
//!     AppSetup::new().routes(|builder| {
//!         builder.get(
//!             "/health",
//!             handler_fn(|_ctx, _req, _params| async {
//!                 Ok(JsonEmitter.success("ok", serde_json::Value::Null, StatusCode::OK))
//!             }),
//!             &[],
//!             true,
//!         )
//!     }),
//! )
//! .unwrap();
//!
//! let response = app
//!     .dispatcher()
//!     .dispatch(&Method::GET, "/v1/health", HeaderMap::new(), Bytes::new())
//!     .await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → Version → Match → Decode body → Global MW → Route MW → Handler
//!                                                                    ↓
//! Response ← Trace + version headers ←───────────────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/farmgate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;

pub use bootstrap::{AppSetup, Application, BootstrapError};

// Re-export core types
pub use farmgate_core as core;

// Re-export versioning types
pub use farmgate_versioning as versioning;

// Re-export middleware types
pub use farmgate_middleware as middleware;

// Re-export body decoding
pub use farmgate_extract as extract;

// Re-export router types
pub use farmgate_router as router;

// Re-export discovery types
pub use farmgate_discovery as discovery;

// Re-export configuration types
pub use farmgate_config as config;

// Re-export telemetry setup
pub use farmgate_telemetry as telemetry;

/// Installs the global logging subscriber described by `config.logging`.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` on an invalid filter or when a
/// subscriber is already installed.
pub fn init_logging(
    config: &farmgate_config::FarmgateConfig,
) -> Result<(), farmgate_telemetry::TelemetryError> {
    farmgate_telemetry::init_logging(&config.logging.to_log_config())
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use farmgate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{AppSetup, Application, BootstrapError};

    pub use farmgate_core::{
        handler_fn, BoxFuture, DispatchError, DispatchResult, Handler, JsonEmitter, Request,
        RequestBody, RequestContext, Response, ResponseEmitter, TraceIdentifiers, Ulid,
    };

    pub use farmgate_config::{ConfigLoader, FarmgateConfig};

    pub use farmgate_discovery::{
        ActionMeta, ActionPayload, Controller, ControllerCatalog, ControllerDescriptor,
        ControllerMetadata, DiscoveryOutcome, RouteGroup,
    };

    pub use farmgate_middleware::{Middleware, MiddlewareRegistry, Next};

    pub use farmgate_router::{Dispatcher, RouteTableBuilder};

    pub use farmgate_versioning::VersionResolver;
}

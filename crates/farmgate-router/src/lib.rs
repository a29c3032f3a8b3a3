//! # Farmgate Router
//!
//! Route table compilation, matching and dispatch for the Farmgate dispatch core.
//!
//! - [`RoutePattern`] - `{name}` path templates compiled to anchored regexes
//! - [`RouteTableBuilder`] - route registration with groups and global middleware
//! - [`RouteTable`] - immutable routes, first registered match wins
//! - [`Dispatcher`] - the per-request pipeline over an atomically swappable table
//!
//! # Example
//!
//! ```
//! # tokio_test::block_on(async {
//! use bytes::Bytes;
//! use farmgate_core::{handler_fn, JsonEmitter, ResponseEmitter};
//! use farmgate_middleware::MiddlewareRegistry;
//! use farmgate_router::{Dispatcher, RouteTableBuilder};
//! use farmgate_versioning::VersionResolver;
//! use http::{HeaderMap, Method, StatusCode};
//! use std::sync::Arc;
//!
//! let mut builder = RouteTableBuilder::new(Arc::new(MiddlewareRegistry::standard()));
//! builder
//!     .get(
//!         "/users/{id}",
//!         handler_fn(|_ctx, _req, params| async move {
//!             Ok(JsonEmitter.success("user", serde_json::json!({ "id": params[0] }), StatusCode::OK))
//!         }),
//!         &[],
//!         true,
//!     )
//!     .unwrap();
//!
//! let versions = Arc::new(VersionResolver::builder().supported(["v1"]).build().unwrap());
//! let dispatcher = Dispatcher::new(builder.build(), versions);
//!
//! let response = dispatcher
//!     .dispatch(&Method::GET, "/v1/users/42", HeaderMap::new(), Bytes::new())
//!     .await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.headers()["x-api-version"], "v1");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/farmgate-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod error;
mod pattern;
mod route;
mod table;

pub use dispatcher::{Dispatcher, ENDPOINT_NOT_FOUND};
pub use error::RouteError;
pub use pattern::RoutePattern;
pub use route::{Route, RouteMatch};
pub use table::{RouteTable, RouteTableBuilder};

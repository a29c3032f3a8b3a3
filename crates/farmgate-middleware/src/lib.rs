//! # Farmgate Middleware
//!
//! Middleware chains for the Farmgate dispatch core.
//!
//! Routes name their middleware with string tags. At route-compile time each
//! tag is parsed into a [`MiddlewareSpec`] and resolved through a
//! [`MiddlewareRegistry`]; the resulting [`MiddlewareChain`] is stored with
//! the route and run onion-style at dispatch time.
//!
//! ```text
//! Request → global → group (outer → inner) → route → Endpoint
//!                                                       ↓
//! Response ← global ← group (inner → outer) ← route ←───┘
//! ```
//!
//! Any middleware that does not run its [`Next`] short-circuits the rest of
//! the chain.
//!
//! ## Built-in stages
//!
//! | Tag | Stage |
//! |---|---|
//! | `auth` | [`stages::RequireAuthentication`] |
//! | `permission:<p>`, `permissionAny:<p,..>`, `permissionAll:<p,..>` | [`stages::PermissionMiddleware`] |
//! | `scope:<s>` | [`stages::ScopeMiddleware`] |

#![doc(html_root_url = "https://docs.rs/farmgate-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
mod error;
pub mod middleware;
pub mod registry;
pub mod spec;
pub mod stages;

pub use chain::MiddlewareChain;
pub use error::MiddlewareError;
pub use middleware::{BoxedMiddleware, Endpoint, FnEndpoint, FnMiddleware, Middleware, Next};
pub use registry::{MiddlewareRegistry, AUTH_MIDDLEWARE};
pub use spec::MiddlewareSpec;

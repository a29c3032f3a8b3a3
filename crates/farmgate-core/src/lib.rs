//! # Farmgate Core
//!
//! Core types and contracts for the Farmgate dispatch core.
//!
//! This crate provides the foundational types shared by every other Farmgate crate:
//!
//! - [`Ulid`] - Sortable 26-character Crockford Base32 identifier
//! - [`TraceIdentifiers`] - Per-request correlation/transaction/request triple
//! - [`Request`] / [`RequestBody`] - Decoded request handed to handlers
//! - [`RequestContext`] - Per-request state (trace ids, version, route, principal)
//! - [`DispatchError`] - Standard error type with category and status mapping
//! - [`Handler`] - Terminal handler contract
//! - [`ResponseEmitter`] - Response rendering contract with a default [`JsonEmitter`]
//! - [`ConfigLookup`] - Narrow configuration-lookup contract

#![doc(html_root_url = "https://docs.rs/farmgate-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod lookup;
mod method;
mod request;
mod response;
mod trace;
pub mod ulid;

pub use context::{MatchedRoute, Principal, RequestContext, VersionContext};
pub use error::{DispatchError, DispatchResult, ErrorCategory};
pub use handler::{handler_fn, BoxFuture, BoxedHandler, FnHandler, Handler};
pub use lookup::{ConfigLookup, EnvLookup, MapLookup};
pub use method::{HttpMethod, UnsupportedMethod};
pub use request::{Request, RequestBody, UploadedFile};
pub use response::{JsonEmitter, Response, ResponseEmitter};
pub use trace::{
    TraceIdentifiers, CORRELATION_ID_HEADER, REQUEST_ID_HEADER, TRANSACTION_ID_HEADER,
};
pub use ulid::{InvalidUlid, Ulid};

//! # Farmgate Extract
//!
//! Request body decoding for the Farmgate dispatch core.
//!
//! The dispatcher hands every buffered body to a [`BodyDecoder`] before any
//! middleware runs. Oversized and malformed bodies are rejected there, so
//! middleware and handlers only ever see a decoded [`RequestBody`].
//!
//! | Content-Type | Result |
//! |---|---|
//! | `application/json`, `application/*+json` | [`RequestBody::Json`] |
//! | `application/x-www-form-urlencoded` | [`RequestBody::Form`] |
//! | `multipart/form-data` | [`RequestBody::Multipart`] |
//! | anything else | [`RequestBody::Raw`] |
//!
//! [`RequestBody`]: farmgate_core::RequestBody
//! [`RequestBody::Json`]: farmgate_core::RequestBody::Json
//! [`RequestBody::Form`]: farmgate_core::RequestBody::Form
//! [`RequestBody::Multipart`]: farmgate_core::RequestBody::Multipart
//! [`RequestBody::Raw`]: farmgate_core::RequestBody::Raw

#![doc(html_root_url = "https://docs.rs/farmgate-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decoder;
mod form;
mod multipart;
mod preview;

pub use decoder::{BodyDecoder, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_PREVIEW_CHARS};
pub use form::{parse_query, parse_urlencoded};
pub use multipart::parse_multipart;
pub use preview::sanitize_preview;

//! Error types for dispatch.
//!
//! [`DispatchError`] is what handlers return and what the dispatcher produces
//! for decoding failures. Every variant maps to an [`ErrorCategory`], which in
//! turn fixes the HTTP status and the machine-readable code written into the
//! error envelope.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Categories of errors for classification and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Body exceeds the configured maximum.
    PayloadTooLarge,
    /// Body declared as JSON does not parse.
    InvalidJson,
    /// Any other malformed input.
    BadRequest,
    /// No route or resource.
    NotFound,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated but not permitted.
    Forbidden,
    /// Server-side failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidJson | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::InvalidJson => "INVALID_JSON",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Standard error type for dispatch and handlers.
///
/// # Example
///
/// ```
/// use farmgate_core::{DispatchError, ErrorCategory};
///
/// let err = DispatchError::not_found("user_not_found");
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// assert_eq!(err.message_key(), "user_not_found");
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Request body is larger than allowed.
    #[error("payload too large: {actual} bytes exceeds limit of {limit}")]
    PayloadTooLarge {
        /// Configured maximum in bytes.
        limit: usize,
        /// Declared or actual size in bytes.
        actual: usize,
    },

    /// JSON body failed to parse.
    #[error("invalid JSON: {message}")]
    InvalidJson {
        /// Parser message.
        message: String,
    },

    /// Body could not be decoded for its content type.
    #[error("malformed body: {message}")]
    MalformedBody {
        /// Decoder message.
        message: String,
    },

    /// Nothing found.
    #[error("not found: {message_key}")]
    NotFound {
        /// Translatable message key.
        message_key: String,
    },

    /// Authentication required or failed.
    #[error("unauthorized: {message_key}")]
    Unauthorized {
        /// Translatable message key.
        message_key: String,
    },

    /// Caller lacks the required permission.
    #[error("forbidden: {message_key}")]
    Forbidden {
        /// Translatable message key.
        message_key: String,
    },

    /// Internal failure.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DispatchError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message_key: impl Into<String>) -> Self {
        Self::NotFound {
            message_key: message_key.into(),
        }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message_key: impl Into<String>) -> Self {
        Self::Unauthorized {
            message_key: message_key.into(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message_key: impl Into<String>) -> Self {
        Self::Forbidden {
            message_key: message_key.into(),
        }
    }

    /// Creates a malformed-body error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::PayloadTooLarge { .. } => ErrorCategory::PayloadTooLarge,
            Self::InvalidJson { .. } => ErrorCategory::InvalidJson,
            Self::MalformedBody { .. } => ErrorCategory::BadRequest,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Unauthorized { .. } => ErrorCategory::Unauthorized,
            Self::Forbidden { .. } => ErrorCategory::Forbidden,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.category().code()
    }

    /// Returns the message key rendered to clients.
    ///
    /// Internal details never leak; internal errors always render as `server_error`.
    #[must_use]
    pub fn message_key(&self) -> &str {
        match self {
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::InvalidJson { .. } => "invalid_json",
            Self::MalformedBody { .. } => "bad_request",
            Self::NotFound { message_key }
            | Self::Unauthorized { message_key }
            | Self::Forbidden { message_key } => message_key,
            Self::Internal { .. } => "server_error",
        }
    }
}

//! Response type and the response-emitter contract.

use crate::error::DispatchError;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde_json::Value;

/// HTTP response type used throughout Farmgate.
pub type Response = http::Response<Full<Bytes>>;

/// Renders dispatch outcomes into HTTP responses.
///
/// The dispatcher calls the emitter for unmatched routes, oversized payloads,
/// malformed JSON and handler errors. Swap in a custom emitter to change the
/// envelope format.
pub trait ResponseEmitter: Send + Sync + 'static {
    /// Renders a successful payload.
    fn success(&self, message_key: &str, data: Value, status: StatusCode) -> Response;

    /// Renders an error with a message key and machine-readable code.
    fn error(&self, message_key: &str, code: &str, status: StatusCode) -> Response;

    /// 400 with code `BAD_REQUEST`.
    fn bad_request(&self, message_key: &str) -> Response {
        self.error(message_key, "BAD_REQUEST", StatusCode::BAD_REQUEST)
    }

    /// 404 with code `NOT_FOUND`.
    fn not_found(&self, message_key: &str) -> Response {
        self.error(message_key, "NOT_FOUND", StatusCode::NOT_FOUND)
    }

    /// 413 with code `PAYLOAD_TOO_LARGE`.
    fn payload_too_large(&self, message_key: &str) -> Response {
        self.error(message_key, "PAYLOAD_TOO_LARGE", StatusCode::PAYLOAD_TOO_LARGE)
    }

    /// 500 with code `INTERNAL_ERROR`.
    fn server_error(&self, message_key: &str) -> Response {
        self.error(message_key, "INTERNAL_ERROR", StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Renders a [`DispatchError`] by category.
    fn from_error(&self, err: &DispatchError) -> Response {
        self.error(err.message_key(), err.code(), err.status_code())
    }
}

/// The default JSON envelope emitter.
///
/// Success: `{"success":true,"message":key,"data":...}`.
/// Error: `{"success":false,"error":{"code":...,"message":key}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

impl JsonEmitter {
    fn json(status: StatusCode, body: &Value) -> Response {
        let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

impl ResponseEmitter for JsonEmitter {
    fn success(&self, message_key: &str, data: Value, status: StatusCode) -> Response {
        let body = serde_json::json!({
            "success": true,
            "message": message_key,
            "data": data,
        });
        Self::json(status, &body)
    }

    fn error(&self, message_key: &str, code: &str, status: StatusCode) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": code,
                "message": message_key,
            }
        });
        Self::json(status, &body)
    }
}

//! Content-type driven body decoding.

use crate::form::parse_urlencoded;
use crate::multipart::parse_multipart;
use crate::preview::sanitize_preview;
use bytes::Bytes;
use farmgate_core::{DispatchError, RequestBody};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;

/// Default maximum body size (10 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default length of logged payload previews.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Multipart,
    Other,
}

/// Decodes raw request bodies.
///
/// Decoding order:
///
/// 1. `Content-Length` above the cap is rejected before reading anything.
/// 2. The actual length above the cap is rejected.
/// 3. `multipart/form-data` is handed to the multipart parser untouched.
/// 4. Otherwise a UTF-8 BOM and surrounding whitespace are stripped; what
///    remains is parsed as JSON or URL-encoded form data by content type.
/// 5. Any other content type passes through unmodified as [`RequestBody::Raw`].
///
/// ```
/// # tokio_test::block_on(async {
/// use bytes::Bytes;
/// use farmgate_core::RequestBody;
/// use farmgate_extract::BodyDecoder;
/// use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
///
/// let body = BodyDecoder::default()
///     .decode(&headers, Bytes::from_static(b"{\"a\":1}"))
///     .await
///     .unwrap();
/// assert_eq!(body, RequestBody::Json(serde_json::json!({ "a": 1 })));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyDecoder {
    max_payload_bytes: usize,
    preview_chars: usize,
}

impl BodyDecoder {
    /// Creates a decoder.
    #[must_use]
    pub const fn new(max_payload_bytes: usize, preview_chars: usize) -> Self {
        Self {
            max_payload_bytes,
            preview_chars,
        }
    }

    /// Returns the configured size cap.
    #[must_use]
    pub const fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Returns the configured preview length.
    #[must_use]
    pub const fn preview_chars(&self) -> usize {
        self.preview_chars
    }

    /// Rejects bodies whose declared `Content-Length` exceeds the cap.
    ///
    /// Callers that stream bodies should call this before buffering.
    pub fn check_declared_length(&self, headers: &HeaderMap) -> Result<(), DispatchError> {
        let declared = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok());

        match declared {
            Some(actual) if actual > self.max_payload_bytes => {
                tracing::warn!(
                    content_length = actual,
                    limit = self.max_payload_bytes,
                    "rejecting request: declared payload too large"
                );
                Err(DispatchError::PayloadTooLarge {
                    limit: self.max_payload_bytes,
                    actual,
                })
            }
            _ => Ok(()),
        }
    }

    /// Decodes a buffered body according to its `Content-Type`.
    pub async fn decode(&self, headers: &HeaderMap, body: Bytes) -> Result<RequestBody, DispatchError> {
        self.check_declared_length(headers)?;

        if body.len() > self.max_payload_bytes {
            tracing::warn!(
                size = body.len(),
                limit = self.max_payload_bytes,
                "rejecting request: payload too large"
            );
            return Err(DispatchError::PayloadTooLarge {
                limit: self.max_payload_bytes,
                actual: body.len(),
            });
        }

        if body.is_empty() {
            return Ok(RequestBody::Empty);
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        match classify(content_type) {
            BodyKind::Multipart => parse_multipart(content_type, body).await,
            BodyKind::Other => Ok(RequestBody::Raw(body)),
            kind => {
                let text = normalize(&body)?;
                if text.is_empty() {
                    return Ok(RequestBody::Empty);
                }
                if kind == BodyKind::Json {
                    self.decode_json(text)
                } else {
                    parse_urlencoded(text).map(RequestBody::Form)
                }
            }
        }
    }

    fn decode_json(&self, text: &str) -> Result<RequestBody, DispatchError> {
        serde_json::from_str(text).map(RequestBody::Json).map_err(|e| {
            tracing::warn!(
                error = %e,
                preview = %sanitize_preview(text, self.preview_chars),
                "rejecting request: malformed JSON body"
            );
            DispatchError::InvalidJson {
                message: e.to_string(),
            }
        })
    }
}

impl Default for BodyDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_PREVIEW_CHARS)
    }
}

fn classify(content_type: &str) -> BodyKind {
    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return BodyKind::Other;
    };

    let (top, sub) = (mime.type_(), mime.subtype());
    if top == mime::APPLICATION && (sub == mime::JSON || mime.suffix() == Some(mime::JSON)) {
        BodyKind::Json
    } else if top == mime::APPLICATION && sub == mime::WWW_FORM_URLENCODED {
        BodyKind::Form
    } else if top == mime::MULTIPART && sub == mime::FORM_DATA {
        BodyKind::Multipart
    } else {
        BodyKind::Other
    }
}

/// Strips a UTF-8 BOM and surrounding whitespace.
fn normalize(body: &[u8]) -> Result<&str, DispatchError> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    std::str::from_utf8(body)
        .map(str::trim)
        .map_err(|e| DispatchError::malformed(format!("body is not valid UTF-8: {e}")))
}

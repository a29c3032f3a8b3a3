//! Per-request trace identifiers.

use crate::ulid::{self, Ulid};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Correlation id header, propagated across services.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
/// Transaction id header, propagated across services.
pub const TRANSACTION_ID_HEADER: &str = "x-transaction-id";
/// Request id header, unique per request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The correlation/transaction/request triple attached to every request.
///
/// Correlation and transaction ids are taken from the incoming headers when
/// they hold a valid ULID. The request id is always freshly minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceIdentifiers {
    /// Identifier shared by every hop of a logical operation.
    pub correlation_id: Ulid,
    /// Identifier of the business transaction.
    pub transaction_id: Ulid,
    /// Identifier of this single request.
    pub request_id: Ulid,
}

impl TraceIdentifiers {
    /// Mints three fresh identifiers.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            correlation_id: ulid::generate(),
            transaction_id: ulid::generate(),
            request_id: ulid::generate(),
        }
    }

    /// Seeds identifiers from incoming headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        Self {
            correlation_id: ulid::resolve_incoming(header(CORRELATION_ID_HEADER), ulid::generate),
            transaction_id: ulid::resolve_incoming(header(TRANSACTION_ID_HEADER), ulid::generate),
            request_id: ulid::generate(),
        }
    }

    /// Writes all three identifiers onto `headers`, replacing existing values.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, id) in [
            (CORRELATION_ID_HEADER, &self.correlation_id),
            (TRANSACTION_ID_HEADER, &self.transaction_id),
            (REQUEST_ID_HEADER, &self.request_id),
        ] {
            // ULIDs are ASCII alphanumerics, always a valid header value
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                headers.insert(HeaderName::from_static(name), value);
            }
        }
    }
}

impl Default for TraceIdentifiers {
    fn default() -> Self {
        Self::generate()
    }
}

//! Request identity.
//!
//! # Responsibilities
//! - Generate a unique request ID for every incoming request
//! - Carry the ID through logs and onto the response
//!
//! # Design Decisions
//! - Request ID is set at the outermost layer so every log line and
//!   the forwarded request carry it
//! - Incoming `x-request-id` headers are preserved, not overwritten

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 per request for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

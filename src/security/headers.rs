//! Security response headers and CORS.
//!
//! # Responsibilities
//! - Add hardening headers to the relay's own responses
//! - Answer CORS preflights and allow browser callers from any origin
//!
//! # Design Decisions
//! - Hardening headers are never applied to relayed responses; those carry
//!   the target's headers verbatim
//! - Headers are only set when absent

use axum::body::Body;
use axum::http::header::{HeaderName, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::CorsLayer;

const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");

pub fn security_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (CROSS_ORIGIN_RESOURCE_POLICY, HeaderValue::from_static("cross-origin")),
    ]
}

/// Middleware adding [`security_headers`] to every response that lacks them.
pub async fn apply_security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in security_headers() {
        headers.entry(name).or_insert(value);
    }
    response
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

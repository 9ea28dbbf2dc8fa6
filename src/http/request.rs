//! Request accessors and per-request middleware.
//!
//! # Responsibilities
//! - Read hostname, method, and original URL for the framework
//! - Generate a unique request ID (UUID v4) and propagate it
//! - Record request metrics
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - `X-Forwarded-Host` is honored only when the `trust proxy` setting is on
//! - Nested routers strip path prefixes; the original URI is preferred

use std::time::Instant;

use axum::body::Body;
use axum::extract::OriginalUri;
use axum::http::{header, HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::observability::metrics;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Hostname of the request without port.
pub fn hostname(req: &Request<Body>, trust_proxy: bool) -> Option<String> {
    let forwarded = trust_proxy
        .then(|| req.headers().get(X_FORWARDED_HOST))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let host = forwarded.or_else(|| {
        req.headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| req.uri().host())
    })?;

    Some(strip_port(host).to_string())
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal: keep the brackets, drop anything after them.
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

/// Request method as an upper-case string.
pub fn method(req: &Request<Body>) -> &str {
    req.method().as_str()
}

/// Path and query as originally received.
pub fn original_url(req: &Request<Body>) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| req.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Request ID generator backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Middleware that records request count and latency.
pub async fn record_metrics(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let response = next.run(req).await;
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

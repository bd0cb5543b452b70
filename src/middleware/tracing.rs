// ABOUTME: Request tracing middleware for correlation and structured access logging
// ABOUTME: Assigns request IDs, opens a span per request and logs status and latency
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{field::Empty, info, info_span, Instrument, Span};
use uuid::Uuid;

/// Header carrying the correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate a request ID in the `req_<uuid>` form
#[must_use]
pub fn new_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Create a tracing span for HTTP requests
pub fn create_request_span(method: &str, path: &str, request_id: &str) -> Span {
    info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
        status_code = Empty,
        duration_ms = Empty,
    )
}

/// Log every request with its status and latency
///
/// Reuses an inbound `x-request-id` and echoes it on the response.
pub async fn trace_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(new_request_id, str::to_owned);
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    let span = create_request_span(method.as_str(), &path, &request_id);
    let mut response = next.run(request).instrument(span.clone()).await;

    let duration_ms = started.elapsed().as_millis();
    let status = response.status().as_u16();
    span.record("status_code", status);
    span.record("duration_ms", duration_ms);
    span.in_scope(|| {
        info!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            remote_addr = remote_addr.as_deref().unwrap_or("-"),
            "HTTP request"
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

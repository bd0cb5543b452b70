// ABOUTME: CORS headers for the OAuth discovery and token endpoints
// ABOUTME: Lets browser-based MCP clients read metadata and exchange codes cross-origin
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    },
    HeaderValue,
};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

/// Allowed origins for OAuth endpoints
pub const ALLOW_ORIGIN: &str = "*";
/// Allowed methods for OAuth endpoints
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
/// Allowed request headers for OAuth endpoints
pub const ALLOW_HEADERS: &str = "Authorization, Content-Type, Accept";

/// Attach the OAuth CORS headers to every response of `router`
///
/// Preflight requests are answered by the routes themselves (`204`), so this
/// only decorates responses instead of intercepting `OPTIONS`.
pub fn with_oauth_cors<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
}

// ABOUTME: HTTP middleware for bearer authentication, OAuth CORS and request tracing
// ABOUTME: Provides the AuthGate, CORS header layers and per-request access logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Bearer token gate for protocol endpoints
pub mod auth;
/// CORS headers for OAuth endpoints
pub mod cors;
/// Request IDs and access logging
pub mod tracing;

pub use auth::{require_bearer, AuthGate, AuthRejection};
pub use cors::with_oauth_cors;
pub use tracing::{create_request_span, new_request_id, trace_requests, REQUEST_ID_HEADER};

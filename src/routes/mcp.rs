// ABOUTME: MCP (Model Context Protocol) route handlers binding the dispatcher to HTTP
// ABOUTME: Unary JSON, single-shot SSE and long-lived bidirectional SSE session transports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! MCP protocol routes, all behind the bearer gate.
//!
//! `POST /mcp` answers with JSON, or with a single SSE record when the client
//! accepts `text/event-stream`. `GET /mcp` opens a bidirectional session fed
//! by newline-delimited JSON-RPC messages in the request body.

use crate::constants::sse::{BODY_PIPE_BYTES, CONTENT_TYPE as SSE_CONTENT_TYPE};
use crate::jsonrpc::JsonRpcResponse;
use crate::mcp::resources::ServerResources;
use crate::middleware::require_bearer;
use crate::oauth2_server::models::Principal;
use crate::sse::{format_frame, run_session, SseWriter};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use futures_util::{StreamExt, TryStreamExt};
use std::io;
use std::sync::Arc;
use tokio::io::duplex;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, error};

/// MCP routes implementation
pub struct McpRoutes;

impl McpRoutes {
    /// Create all MCP routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/mcp", get(Self::handle_session).post(Self::handle_post))
            .route_layer(middleware::from_fn_with_state(
                resources.auth_gate.clone(),
                require_bearer,
            ))
            .with_state(resources)
    }

    /// Unary and single-shot SSE bindings
    async fn handle_post(
        State(resources): State<Arc<ServerResources>>,
        Extension(principal): Extension<Principal>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let Some(response) = resources.dispatcher.handle_raw(&body, &principal) else {
            return StatusCode::ACCEPTED.into_response();
        };

        if accepts_event_stream(&headers) {
            single_shot_sse(&response)
        } else {
            Json(response).into_response()
        }
    }

    /// Bidirectional session binding
    async fn handle_session(
        State(resources): State<Arc<ServerResources>>,
        Extension(principal): Extension<Principal>,
        body: Body,
    ) -> Response {
        let cancel = resources.shutdown.child_token();
        let input = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
        let (sink, source) = duplex(BODY_PIPE_BYTES);

        let session_cancel = cancel.clone();
        tokio::spawn(async move {
            let summary = run_session(
                input,
                SseWriter::new(sink),
                &resources.dispatcher,
                &principal,
                &resources.config.session,
                session_cancel,
            )
            .await;
            debug!(?summary, "Session task finished");
        });

        // Dropping the response body (client gone) cancels the session
        let disconnect_guard = cancel.drop_guard();
        let stream = ReaderStream::new(source).map(move |chunk| {
            let _ = &disconnect_guard;
            chunk
        });

        event_stream_response(Body::from_stream(stream))
    }
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(SSE_CONTENT_TYPE))
}

fn single_shot_sse(response: &JsonRpcResponse) -> Response {
    match serde_json::to_string(response) {
        Ok(payload) => event_stream_response(Body::from(format_frame(None, &payload))),
        Err(e) => {
            error!(error = %e, "Failed to serialize MCP response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn event_stream_response(body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(SSE_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

// ABOUTME: JSON-RPC dispatcher routing MCP methods to their handlers
// ABOUTME: Handles initialize, notifications, tools/list, tools/call and ping for every transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # MCP Protocol Dispatcher
//!
//! Transport independent: the unary, single-shot SSE and bidirectional
//! session bindings all hand decoded envelopes to [`ProtocolDispatcher`].

use super::schema::{get_tools, InitializeResponse, ToolCallParams, ToolResponse, ToolSchema};
use super::tools::{ToolCall, ToolError};
use crate::constants::methods::{
    INITIALIZE, INITIALIZED, NOTIFICATIONS_INITIALIZED, PING, TOOLS_CALL, TOOLS_LIST,
};
use crate::jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse};
use crate::oauth2_server::models::Principal;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Routes JSON-RPC requests to the fixed MCP handler table
#[derive(Debug, Clone)]
pub struct ProtocolDispatcher {
    tools: Vec<ToolSchema>,
}

impl ProtocolDispatcher {
    /// Create a dispatcher serving the built-in tool set
    #[must_use]
    pub fn new() -> Self {
        Self { tools: get_tools() }
    }

    /// Decode one raw message and dispatch it
    ///
    /// A malformed envelope yields a parse error response with a `null` id.
    #[must_use]
    pub fn handle_raw(&self, raw: &[u8], principal: &Principal) -> Option<JsonRpcResponse> {
        match serde_json::from_slice::<JsonRpcRequest>(raw) {
            Ok(request) => self.dispatch(request, principal),
            Err(e) => {
                warn!(error = %e, "Failed to parse JSON-RPC request");
                Some(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    "Parse error",
                ))
            }
        }
    }

    /// Dispatch a decoded request; `None` means nothing is sent back
    #[must_use]
    pub fn dispatch(
        &self,
        request: JsonRpcRequest,
        principal: &Principal,
    ) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, user = %principal.login, "Dispatching MCP request");

        let id = request.id;
        match request.method.as_str() {
            INITIALIZE => Some(to_result(id, &InitializeResponse::current())),
            INITIALIZED | NOTIFICATIONS_INITIALIZED => {
                debug!(user = %principal.login, "Client finished initialization");
                None
            }
            TOOLS_LIST => Some(to_result(id, &json!({ "tools": self.tools }))),
            TOOLS_CALL => Some(Self::handle_tools_call(id, request.params, principal)),
            PING => Some(JsonRpcResponse::success(id, json!({}))),
            other => {
                debug!(method = other, "Method not found");
                Some(JsonRpcResponse::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    "Method not found",
                ))
            }
        }
    }

    fn handle_tools_call(
        id: Option<Value>,
        params: Option<Value>,
        principal: &Principal,
    ) -> JsonRpcResponse {
        let Some(params) = params
            .and_then(|raw| serde_json::from_value::<ToolCallParams>(raw).ok())
        else {
            return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Invalid params");
        };

        let call = match ToolCall::decode(&params.name, params.arguments) {
            Ok(call) => call,
            Err(e @ ToolError::UnknownTool(_)) => {
                warn!(tool = %params.name, user = %principal.login, "Unknown tool requested");
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, e.to_string());
            }
            Err(e @ ToolError::InvalidArguments { .. }) => {
                warn!(error = %e, "Tool arguments rejected");
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Invalid params");
            }
        };

        let started = Instant::now();
        let text = call.execute(principal, Utc::now());
        info!(
            tool = call.name(),
            user = %principal.login,
            duration_ms = started.elapsed().as_millis(),
            "Tool executed"
        );
        to_result(id, &ToolResponse::text(text))
    }
}

impl Default for ProtocolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn to_result<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            warn!(error = %e, "Failed to serialize MCP result");
            JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, "Internal error")
        }
    }
}

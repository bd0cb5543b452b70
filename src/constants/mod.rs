// ABOUTME: System-wide constants for the MCP hello-world server
// ABOUTME: Protocol versions, OAuth lifetimes, upstream GitHub endpoints and SSE framing values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Hardcoded protocol and security constants. Anything an operator may want
//! to tune lives in [`crate::config`] instead.

/// Protocol-related constants
pub mod protocol {
    /// MCP protocol version reported by the `initialize` handshake
    pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

    /// `JSON-RPC` version (standard, not configurable)
    pub const JSONRPC_VERSION: &str = "2.0";

    /// Server name reported in `serverInfo`
    pub const SERVER_NAME: &str = "mcp-hello-world";

    /// Server version reported in `serverInfo`
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// OAuth 2.0 lifetimes and identifier sizes
pub mod oauth {
    /// Authorization codes are rejected at redemption once older than this
    pub const AUTH_CODE_TTL_SECS: i64 = 600;

    /// Lifetime of proxy-issued access tokens
    pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

    /// Random bytes behind an internal state id
    pub const STATE_ID_BYTES: usize = 32;

    /// Random bytes behind an authorization code
    pub const AUTH_CODE_BYTES: usize = 32;

    /// Random bytes behind access and refresh tokens
    pub const TOKEN_BYTES: usize = 64;

    /// The only PKCE challenge method accepted at `/oauth/authorize`
    pub const PKCE_METHOD_S256: &str = "S256";

    /// Token type returned by the token endpoint
    pub const TOKEN_TYPE_BEARER: &str = "Bearer";

    /// Grant type for authorization-code redemption
    pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";

    /// Grant type for refresh-token rotation
    pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";
}

/// Upstream GitHub OAuth application endpoints
pub mod github {
    /// Browser-facing authorize endpoint
    pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

    /// Code and refresh-token exchange endpoint
    pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

    /// REST API base
    pub const API_BASE_URL: &str = "https://api.github.com";

    /// REST API version header value
    pub const API_VERSION: &str = "2022-11-28";

    /// Media type for REST API requests
    pub const API_ACCEPT: &str = "application/vnd.github+json";

    /// Scopes requested from GitHub
    pub const SCOPES: &str = "read:user read:org user:email";

    /// Upstream token lifetime assumed when GitHub omits `expires_in`
    pub const DEFAULT_TOKEN_TTL_SECS: i64 = 8 * 3600;

    /// Timeout applied to every upstream request
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Server-Sent Events framing
pub mod sse {
    /// Event name for protocol responses on a streaming session
    pub const EVENT_MESSAGE: &str = "message";

    /// Event name for keepalive frames
    pub const EVENT_KEEPALIVE: &str = "keepalive";

    /// Payload carried by keepalive frames
    pub const KEEPALIVE_DATA: &str = r#"{"type":"keepalive"}"#;

    /// Media type of SSE responses
    pub const CONTENT_TYPE: &str = "text/event-stream";

    /// In-memory pipe size between the session writer and the response body
    pub const BODY_PIPE_BYTES: usize = 64 * 1024;
}

/// Tool names exposed by `tools/list`
pub mod tools {
    /// Static greeting for the authenticated user
    pub const HELLO_WORLD: &str = "hello_world";

    /// Personalized greeting
    pub const GREET: &str = "greet";

    /// Authenticated GitHub identity
    pub const WHOAMI: &str = "whoami";

    /// Echo a message back
    pub const ECHO: &str = "echo";

    /// Current server time
    pub const GET_TIME: &str = "get_time";
}

/// JSON-RPC method names handled by the dispatcher
pub mod methods {
    /// Handshake
    pub const INITIALIZE: &str = "initialize";

    /// Handshake completion notification (legacy name)
    pub const INITIALIZED: &str = "initialized";

    /// Handshake completion notification
    pub const NOTIFICATIONS_INITIALIZED: &str = "notifications/initialized";

    /// Tool enumeration
    pub const TOOLS_LIST: &str = "tools/list";

    /// Tool invocation
    pub const TOOLS_CALL: &str = "tools/call";

    /// Liveness check
    pub const PING: &str = "ping";
}

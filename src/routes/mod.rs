// ABOUTME: Route module organization for the MCP Hello World HTTP endpoints
// ABOUTME: OAuth proxy, MCP transports, health checks and the landing page
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Each domain module contains route definitions and thin handlers that
//! delegate to the proxy or the dispatcher.

/// Health check and readiness routes
pub mod health;
/// Model Context Protocol (MCP) transport routes
pub mod mcp;
/// OAuth 2.0 authorization proxy routes
pub mod oauth2;
/// Landing page
pub mod root;

pub use health::HealthRoutes;
pub use mcp::McpRoutes;
pub use oauth2::OAuth2Routes;
pub use root::RootRoutes;

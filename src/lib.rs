// ABOUTME: Main library entry point for the MCP hello-world server
// ABOUTME: GitHub-backed OAuth 2.0 proxy with unary, SSE and streaming JSON-RPC transports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # MCP Hello World
//!
//! A Model Context Protocol (MCP) server that fronts GitHub as its identity
//! provider. MCP clients authenticate through a standards-shaped OAuth 2.0
//! authorization server (authorization code grant with PKCE S256) that this
//! crate runs itself; GitHub tokens never reach the client.
//!
//! ## Architecture
//!
//! - **`oauth2_client`**: GitHub token exchange, refresh and user lookups
//! - **`oauth2_server`**: Authorization proxy, PKCE and the credential store
//! - **`mcp`**: JSON-RPC dispatcher and the five demonstration tools
//! - **`sse`**: Frame writer and the bidirectional streaming session
//! - **`routes`**: HTTP bindings for every transport and OAuth endpoint
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mcp_hello_world::config::ServerConfig;
//! use mcp_hello_world::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("MCP Hello World configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Application constants and protocol identifiers
pub mod constants;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// JSON-RPC 2.0 message types
pub mod jsonrpc;

/// Production logging and structured output
pub mod logging;

/// Model Context Protocol dispatcher and tools
pub mod mcp;

/// HTTP middleware for bearer authentication, CORS and request tracing
pub mod middleware;

/// OAuth 2.0 client for the upstream identity provider
pub mod oauth2_client;

/// OAuth 2.0 authorization server proxy
pub mod oauth2_server;

/// HTTP route handlers
pub mod routes;

/// Server assembly and lifecycle
pub mod server;

/// Server-Sent Events framing and streaming sessions
pub mod sse;

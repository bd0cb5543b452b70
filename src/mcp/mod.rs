// ABOUTME: Model Context Protocol (MCP) implementation for AI assistant integration
// ABOUTME: Dispatcher, schemas, typed tools and the shared resource container
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// JSON-RPC method dispatch shared by every transport
pub mod protocol;
/// Centralized resource container for dependency injection
pub mod resources;
/// MCP protocol schema definitions
pub mod schema;
/// Typed tool arguments and execution
pub mod tools;

pub use protocol::ProtocolDispatcher;
pub use resources::ServerResources;

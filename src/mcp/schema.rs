// ABOUTME: MCP protocol schema definitions for the handshake, tool listing and tool results
// ABOUTME: Typed structures serialized into JSON-RPC result payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! MCP Protocol Schema Definitions
//!
//! Type-safe definitions for the handshake response, tool schemas and tool
//! call results, so handlers never assemble protocol JSON by hand.

use crate::constants::protocol::{MCP_PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::constants::tools::{ECHO, GET_TIME, GREET, HELLO_WORLD, WHOAMI};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Server Information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// MCP Tool Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonSchema,
}

/// JSON Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// JSON Schema Property Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

/// `tools/call` parameters before per-tool argument decoding
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Tool Response after execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<Content>,
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResponse {
    /// Single text block result
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }
}

/// Content types for MCP messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

/// MCP Server Capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

/// Tools capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Complete MCP Initialize Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    pub capabilities: ServerCapabilities,
}

impl InitializeResponse {
    /// Handshake response for this server
    #[must_use]
    pub fn current() -> Self {
        Self {
            protocol_version: MCP_PROTOCOL_VERSION.to_owned(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_owned(),
                version: SERVER_VERSION.to_owned(),
            },
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
        }
    }
}

/// Get all available tools
#[must_use]
pub fn get_tools() -> Vec<ToolSchema> {
    vec![
        tool(
            HELLO_WORLD,
            "Returns a friendly greeting for the authenticated user",
            &[],
            &[],
        ),
        tool(
            GREET,
            "Greets someone by name",
            &[("name", string_property("The name of the person to greet"))],
            &["name"],
        ),
        tool(
            WHOAMI,
            "Returns information about the authenticated GitHub user",
            &[],
            &[],
        ),
        tool(
            ECHO,
            "Echoes back the provided message",
            &[("message", string_property("The message to echo back"))],
            &["message"],
        ),
        tool(
            GET_TIME,
            "Returns the current server time",
            &[(
                "format",
                PropertySchema {
                    allowed_values: Some(vec!["iso".into(), "unix".into(), "human".into()]),
                    ..string_property("Time format: 'iso' (default), 'unix' or 'human'")
                },
            )],
            &[],
        ),
    ]
}

fn string_property(description: &str) -> PropertySchema {
    PropertySchema {
        property_type: "string".into(),
        description: Some(description.into()),
        allowed_values: None,
    }
}

fn tool(
    name: &str,
    description: &str,
    properties: &[(&str, PropertySchema)],
    required: &[&str],
) -> ToolSchema {
    ToolSchema {
        name: name.into(),
        description: description.into(),
        input_schema: JsonSchema {
            schema_type: "object".into(),
            properties: properties
                .iter()
                .map(|(key, schema)| ((*key).to_owned(), schema.clone()))
                .collect(),
            required: (!required.is_empty())
                .then(|| required.iter().map(|field| (*field).to_owned()).collect()),
        },
    }
}

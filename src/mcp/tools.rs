// ABOUTME: Typed tool invocations and their handlers
// ABOUTME: Decodes tools/call arguments once per tool and renders the text result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::tools::{ECHO, GET_TIME, GREET, HELLO_WORLD, WHOAMI};
use crate::oauth2_server::models::Principal;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Arguments of `greet`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GreetArgs {
    /// Who to greet; the caller's login when absent or empty
    #[serde(default)]
    pub name: Option<String>,
}

/// Arguments of `echo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EchoArgs {
    /// Text to echo
    #[serde(default)]
    pub message: String,
}

/// Output format of `get_time`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// Seconds since the epoch
    Unix,
    /// Long English form
    Human,
    /// RFC 3339; also any unrecognized format name
    #[default]
    #[serde(other)]
    Iso,
}

/// Arguments of `get_time`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GetTimeArgs {
    /// Requested format
    #[serde(default)]
    pub format: TimeFormat,
}

/// A recognized tool with decoded arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// `hello_world`
    HelloWorld,
    /// `greet`
    Greet(GreetArgs),
    /// `whoami`
    WhoAmI,
    /// `echo`
    Echo(EchoArgs),
    /// `get_time`
    GetTime(GetTimeArgs),
}

/// Tool decoding failures
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    /// Arguments did not match the tool's schema
    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        /// Tool name
        tool: &'static str,
        /// Decode failure
        source: serde_json::Error,
    },
}

fn decode<T: DeserializeOwned + Default>(
    tool: &'static str,
    arguments: Option<Value>,
) -> Result<T, ToolError> {
    match arguments {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|source| ToolError::InvalidArguments { tool, source }),
    }
}

impl ToolCall {
    /// Resolve a tool by name and decode its arguments
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for unregistered names and
    /// [`ToolError::InvalidArguments`] when the arguments do not decode
    pub fn decode(name: &str, arguments: Option<Value>) -> Result<Self, ToolError> {
        match name {
            HELLO_WORLD => Ok(Self::HelloWorld),
            GREET => decode(GREET, arguments).map(Self::Greet),
            WHOAMI => Ok(Self::WhoAmI),
            ECHO => decode(ECHO, arguments).map(Self::Echo),
            GET_TIME => decode(GET_TIME, arguments).map(Self::GetTime),
            other => Err(ToolError::UnknownTool(other.to_owned())),
        }
    }

    /// Tool name as listed by `tools/list`
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HelloWorld => HELLO_WORLD,
            Self::Greet(_) => GREET,
            Self::WhoAmI => WHOAMI,
            Self::Echo(_) => ECHO,
            Self::GetTime(_) => GET_TIME,
        }
    }

    /// Run the tool for `principal` at time `now`
    #[must_use]
    pub fn execute(&self, principal: &Principal, now: DateTime<Utc>) -> String {
        match self {
            Self::HelloWorld => format!(
                "Hello, World! Greetings from the MCP Hello World server. \
                 You are authenticated as @{}.",
                principal.login
            ),
            Self::Greet(args) => {
                let name = args
                    .name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(&principal.login);
                format!("Hello, {name}! Welcome to the MCP Hello World server.")
            }
            Self::WhoAmI => format!(
                "GitHub User Information:\n\
                 - Username: @{}\n\
                 - User ID: {}\n\
                 - Authenticated: yes\n\n\
                 This information is from your GitHub OAuth session.",
                principal.login, principal.id
            ),
            Self::Echo(args) => format!("Echo: {}", args.message),
            Self::GetTime(args) => {
                let rendered = match args.format {
                    TimeFormat::Unix => now.timestamp().to_string(),
                    TimeFormat::Human => now.format("%A, %B %-d, %Y at %-I:%M %p %Z").to_string(),
                    TimeFormat::Iso => now.to_rfc3339_opts(SecondsFormat::Secs, true),
                };
                format!("Current server time: {rendered}")
            }
        }
    }
}

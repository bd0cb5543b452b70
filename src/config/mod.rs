// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven server configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! All settings come from environment variables; the binary may override
//! the listen port and public base URL from the command line.

/// Environment and server configuration
pub mod environment;

pub use environment::{GitHubConfig, ServerConfig, SessionConfig, StoreConfig};

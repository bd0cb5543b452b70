// ABOUTME: Server binary for the MCP hello-world OAuth proxy
// ABOUTME: Loads configuration, initializes logging and serves until SIGINT/SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # MCP Hello World Server Binary
//!
//! Starts the GitHub-backed OAuth proxy together with the unary, single-shot
//! SSE and bidirectional session transports.

use anyhow::Result;
use clap::Parser;
use mcp_hello_world::{
    config::ServerConfig,
    logging,
    mcp::resources::ServerResources,
    oauth2_client::GitHubClient,
    server::McpHelloWorldServer,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mcp-hello-world")]
#[command(about = "MCP hello-world server with a GitHub OAuth 2.0 proxy")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the public base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(base_url) = args.base_url.as_deref() {
        config = config.with_base_url(base_url);
        config.validate()?;
    }

    logging::init_from_env()?;
    info!("{}", config.summary());

    let upstream = Arc::new(GitHubClient::new(&config.github)?);
    let resources = Arc::new(ServerResources::new(config, upstream));
    let server = McpHelloWorldServer::new(resources);

    if let Err(e) = server.run().await {
        error!(error = %e, "Server terminated with an error");
        return Err(e);
    }
    Ok(())
}

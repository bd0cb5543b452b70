// ABOUTME: Landing page describing the server, its endpoints and its tools
// ABOUTME: Rendered once from the tool schemas so the list never drifts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::mcp::schema::get_tools;
use axum::{response::Html, routing::get, Router};
use std::fmt::Write;

/// Root page routes
pub struct RootRoutes;

impl RootRoutes {
    /// Create the `/` route
    pub fn routes() -> Router {
        let page = render_index();
        Router::new().route("/", get(move || async move { Html(page) }))
    }
}

fn render_index() -> String {
    let mut tools = String::new();
    for tool in get_tools() {
        // Writing into a String cannot fail
        let _ = writeln!(
            tools,
            "<li><code>{}</code> - {}</li>",
            tool.name, tool.description
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>MCP Hello World</title></head>
<body>
<h1>MCP Hello World Server</h1>
<p>A reference MCP (Model Context Protocol) server with GitHub OAuth authentication.</p>
<h2>Endpoints</h2>
<ul>
<li><a href="/.well-known/oauth-authorization-server">OAuth Authorization Server Metadata</a></li>
<li><a href="/.well-known/oauth-protected-resource">OAuth Protected Resource Metadata</a></li>
<li><code>POST /mcp</code> - MCP JSON-RPC endpoint (requires authentication)</li>
<li><code>GET /mcp</code> - MCP streaming session (requires authentication)</li>
</ul>
<h2>Available Tools</h2>
<ul>
{tools}</ul>
</body>
</html>
"#
    )
}

// ABOUTME: HTTP server assembly, credential sweeping and graceful shutdown
// ABOUTME: Merges all route groups, applies global layers and serves until SIGINT/SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::oauth::AUTH_CODE_TTL_SECS;
use crate::mcp::resources::ServerResources;
use crate::middleware::trace_requests;
use crate::routes::{HealthRoutes, McpRoutes, OAuth2Routes, RootRoutes};
use anyhow::{Context, Result};
use axum::{middleware, Router};
use chrono::{Duration, Utc};
#[cfg(not(unix))]
use std::future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, error, info, warn};

/// Failures installing process signal handlers
#[derive(Debug, Error)]
pub enum ShutdownSignalError {
    /// Ctrl+C handler could not be installed
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    /// SIGTERM handler could not be installed
    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),
}

/// Wait for SIGINT or SIGTERM
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed
pub async fn shutdown_signal() -> Result<(), ShutdownSignalError> {
    let ctrl_c = async { signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC) };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(ShutdownSignalError::SigTerm)?
            .recv()
            .await;
        Ok::<(), ShutdownSignalError>(())
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<Result<(), ShutdownSignalError>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("Ctrl+C received, shutting down");
        }
        result = terminate => {
            result?;
            info!("SIGTERM received, shutting down");
        }
    }
    Ok(())
}

/// Periodically reclaim expired sessions, codes and access tokens
///
/// Stops when the shutdown token is cancelled.
pub fn spawn_credential_sweeper(resources: &ServerResources) -> JoinHandle<()> {
    let store = Arc::clone(&resources.store);
    let shutdown = resources.shutdown.clone();
    let period = resources.config.store.sweep_interval;
    let session_ttl = Duration::from_std(resources.config.store.auth_session_ttl)
        .unwrap_or_else(|_| Duration::seconds(AUTH_CODE_TTL_SECS));
    let code_ttl = Duration::seconds(AUTH_CODE_TTL_SECS);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let stats = store.purge_expired(Utc::now(), session_ttl, code_ttl);
                    if stats.total() > 0 {
                        debug!(
                            auth_sessions = stats.auth_sessions,
                            auth_codes = stats.auth_codes,
                            access_tokens = stats.access_tokens,
                            "Purged expired credentials"
                        );
                    }
                }
            }
        }
        debug!("Credential sweeper stopped");
    })
}

/// MCP Hello World HTTP server
pub struct McpHelloWorldServer {
    resources: Arc<ServerResources>,
}

impl McpHelloWorldServer {
    /// Create a server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Build the complete application router
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Bind `0.0.0.0:{http_port}` and serve until shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the server fails
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.resources.config.http_port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until SIGINT/SIGTERM or the
    /// shutdown token is cancelled
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let router = self.router();
        let sweeper = spawn_credential_sweeper(&self.resources);

        let shutdown = self.resources.shutdown.clone();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = signal_token.cancelled() => {}
                result = shutdown_signal() => {
                    if let Err(e) = result {
                        error!(error = %e, "Signal handling unavailable");
                        return;
                    }
                    signal_token.cancel();
                }
            }
        });

        info!(
            addr = %local_addr,
            base_url = %self.resources.config.base_url,
            allowed_org = self
                .resources
                .config
                .github
                .allowed_organization
                .as_deref()
                .unwrap_or("-"),
            "Starting mcp-hello-world server"
        );

        let served = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

        self.resources.shutdown.cancel();
        if let Err(e) = sweeper.await {
            warn!(error = %e, "Credential sweeper task failed");
        }
        served.context("HTTP server error")?;
        info!("Server stopped");
        Ok(())
    }
}

/// Assemble every route group with the global layers
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(OAuth2Routes::routes(Arc::clone(resources)))
        .merge(McpRoutes::routes(Arc::clone(resources)))
        .merge(HealthRoutes::routes())
        .merge(RootRoutes::routes())
        .layer(TimeoutLayer::new(resources.config.request_timeout))
        .layer(middleware::from_fn(trace_requests))
}

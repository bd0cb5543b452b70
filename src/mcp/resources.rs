// ABOUTME: Centralized resource container shared by every route and background task
// ABOUTME: Owns the credential store, authorization proxy, dispatcher and shutdown token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources Module
//!
// NOTE: `.clone()` calls in this file share `Arc`s and the cancellation token.
//!
//! Everything is built once at startup and handed to routes as
//! `Arc<ServerResources>`, so the credential store's lifetime is explicit.

use crate::config::ServerConfig;
use crate::mcp::protocol::ProtocolDispatcher;
use crate::middleware::AuthGate;
use crate::oauth2_client::UpstreamOAuthClient;
use crate::oauth2_server::endpoints::AuthorizationProxy;
use crate::oauth2_server::store::CredentialStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Process configuration
    pub config: Arc<ServerConfig>,
    /// Volatile credential store
    pub store: Arc<CredentialStore>,
    /// OAuth authorization proxy
    pub proxy: Arc<AuthorizationProxy>,
    /// Bearer token gate for protocol routes
    pub auth_gate: AuthGate,
    /// JSON-RPC dispatcher shared by all transports
    pub dispatcher: Arc<ProtocolDispatcher>,
    /// Cancelled on server shutdown; sessions derive child tokens from it
    pub shutdown: CancellationToken,
}

impl ServerResources {
    /// Build resources around an upstream identity provider client
    #[must_use]
    pub fn new(config: ServerConfig, upstream: Arc<dyn UpstreamOAuthClient>) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(CredentialStore::new());
        let proxy = Arc::new(AuthorizationProxy::new(
            store.clone(),
            upstream,
            config.base_url.clone(),
            config.github.allowed_organization.clone(),
            config.store.auth_session_ttl,
        ));
        let auth_gate = AuthGate::new(store.clone(), config.base_url.clone());

        Self {
            config,
            store,
            proxy,
            auth_gate,
            dispatcher: Arc::new(ProtocolDispatcher::new()),
            shutdown: CancellationToken::new(),
        }
    }
}

// ABOUTME: OAuth 2.0 route handlers for the GitHub-backed authorization proxy
// ABOUTME: Discovery metadata, authorize, callback, token and token preflight endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! OAuth 2.0 routes. None of these sit behind the bearer gate.

use crate::errors::AppError;
use crate::mcp::resources::ServerResources;
use crate::middleware::with_oauth_cors;
use crate::oauth2_server::models::{
    AuthorizationServerMetadata, AuthorizeRequest, CallbackRequest, OAuth2Error,
    ProtectedResourceMetadata, TokenRequest, TokenResponse,
};
use axum::{
    extract::{rejection::FormRejection, rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use tracing::warn;

/// `OAuth2` routes implementation
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all `OAuth2` routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        let discovery_and_token = Router::new()
            .route(
                "/.well-known/oauth-authorization-server",
                get(Self::handle_authorization_server_metadata),
            )
            .route(
                "/.well-known/oauth-protected-resource",
                get(Self::handle_protected_resource_metadata),
            )
            .route(
                "/oauth/token",
                post(Self::handle_token).options(Self::handle_token_preflight),
            );

        let browser_flow = Router::new()
            .route("/oauth/authorize", get(Self::handle_authorize))
            .route("/oauth/callback", get(Self::handle_callback));

        with_oauth_cors(discovery_and_token)
            .merge(browser_flow)
            .with_state(resources)
    }

    async fn handle_authorization_server_metadata(
        State(resources): State<Arc<ServerResources>>,
    ) -> Json<AuthorizationServerMetadata> {
        Json(resources.proxy.authorization_server_metadata())
    }

    async fn handle_protected_resource_metadata(
        State(resources): State<Arc<ServerResources>>,
    ) -> Json<ProtectedResourceMetadata> {
        Json(resources.proxy.protected_resource_metadata())
    }

    async fn handle_authorize(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<AuthorizeRequest>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let Query(request) = query.map_err(|e| AppError::invalid_input(e.body_text()))?;
        let location = resources.proxy.authorize(request)?;
        Ok(found(&location))
    }

    async fn handle_callback(
        State(resources): State<Arc<ServerResources>>,
        query: Result<Query<CallbackRequest>, QueryRejection>,
    ) -> Result<Response, AppError> {
        let Query(request) = query.map_err(|e| AppError::invalid_input(e.body_text()))?;
        let location = resources.proxy.callback(request).await?;
        Ok(found(&location))
    }

    async fn handle_token(
        State(resources): State<Arc<ServerResources>>,
        form: Result<Form<TokenRequest>, FormRejection>,
    ) -> Result<Json<TokenResponse>, OAuth2Error> {
        let Form(request) = form.map_err(|e| {
            warn!(error = %e, "Malformed token request body");
            OAuth2Error::invalid_request("Request body must be application/x-www-form-urlencoded")
        })?;
        resources.proxy.token(request).await.map(Json)
    }

    async fn handle_token_preflight() -> StatusCode {
        StatusCode::NO_CONTENT
    }
}

/// `302 Found` to `location`
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

// ABOUTME: Bearer token gate for the protocol endpoints
// ABOUTME: Resolves proxy access tokens to a Principal and answers 401 with a discovery hint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::oauth2_server::models::Principal;
use crate::oauth2_server::store::CredentialStore;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a request was not authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization` header
    MissingHeader,
    /// Header present but not `Bearer <token>`
    MalformedHeader,
    /// Token unknown to the store
    UnknownToken,
    /// Token past its expiry
    ExpiredToken,
}

impl AuthRejection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_authorization_header",
            Self::MalformedHeader => "malformed_authorization_header",
            Self::UnknownToken => "unknown_token",
            Self::ExpiredToken => "expired_token",
        }
    }
}

/// Middleware state validating bearer tokens against the credential store
#[derive(Clone)]
pub struct AuthGate {
    store: Arc<CredentialStore>,
    base_url: String,
}

impl AuthGate {
    /// Create a gate over `store`; `base_url` is the fallback for discovery hints
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into(),
        }
    }

    /// Resolve the principal behind an `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when the header is missing, malformed,
    /// or names an unknown or expired token
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<Principal, AuthRejection> {
        let value = auth_header.ok_or(AuthRejection::MissingHeader)?;
        let token = bearer_token(value).ok_or(AuthRejection::MalformedHeader)?;

        let record = self
            .store
            .access_tokens()
            .get(token)
            .map_err(|_| AuthRejection::UnknownToken)?;
        if record.is_expired(Utc::now()) {
            return Err(AuthRejection::ExpiredToken);
        }
        Ok(record.principal())
    }

    /// Protected resource metadata URL as seen by the client
    ///
    /// Honours `X-Forwarded-Proto` and `Host` so clients behind a proxy get
    /// a reachable URL.
    #[must_use]
    pub fn resource_metadata_url(&self, headers: &HeaderMap) -> String {
        let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
        let base = match host {
            Some(host) if !host.is_empty() => {
                let scheme = headers
                    .get("x-forwarded-proto")
                    .and_then(|h| h.to_str().ok())
                    .filter(|proto| matches!(*proto, "http" | "https"))
                    .unwrap_or("http");
                format!("{scheme}://{host}")
            }
            _ => self.base_url.clone(),
        };
        format!("{base}/.well-known/oauth-protected-resource")
    }

    fn unauthorized(&self, headers: &HeaderMap) -> Response {
        let challenge = format!(
            "Bearer resource_metadata=\"{}\"",
            self.resource_metadata_url(headers)
        );
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "unauthorized",
                "message": "Valid Bearer token required",
            })),
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Axum middleware requiring a valid proxy access token
///
/// On success the resolved [`Principal`] is inserted into the request
/// extensions.
pub async fn require_bearer(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match gate.authenticate(auth_header) {
        Ok(principal) => {
            debug!(user = %principal.login, "Bearer authentication succeeded");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(rejection) => {
            warn!(
                reason = rejection.as_str(),
                path = %request.uri().path(),
                "Bearer authentication failed"
            );
            gate.unauthorized(request.headers())
        }
    }
}

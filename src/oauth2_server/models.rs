// ABOUTME: OAuth 2.0 data models for the GitHub-backed authorization proxy
// ABOUTME: Credential records, request/response structures, discovery metadata and error bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::oauth2_client::UpstreamToken;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream account an issued credential is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// GitHub login
    pub login: String,
    /// GitHub numeric user id
    pub id: i64,
}

/// Authenticated identity attached to a protected request
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// GitHub login
    pub login: String,
    /// GitHub numeric user id
    pub id: i64,
    /// Upstream access token for calls made on the user's behalf
    pub upstream_access_token: String,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("login", &self.login)
            .field("id", &self.id)
            .field("upstream_access_token", &"[REDACTED]")
            .finish()
    }
}

/// Pending proxy-initiated OAuth flow, keyed by the internal state id
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// `state` supplied by the client, echoed back on the final redirect
    pub client_state: String,
    /// Client redirect URI
    pub redirect_uri: String,
    /// PKCE challenge (may be empty)
    pub code_challenge: String,
    /// PKCE challenge method (empty or `S256`)
    pub code_challenge_method: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the session is older than `ttl` at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// Proxy-issued authorization code record
#[derive(Debug, Clone)]
pub struct AuthCode {
    /// Tokens obtained from GitHub during the callback
    pub upstream: UpstreamToken,
    /// PKCE challenge recorded at `/authorize`
    pub code_challenge: String,
    /// Redirect URI recorded at `/authorize`
    pub redirect_uri: String,
    /// Resolved GitHub user
    pub user: UserIdentity,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl AuthCode {
    /// Whether the code is older than `ttl` at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// Proxy-issued bearer credential
#[derive(Debug, Clone)]
pub struct AccessTokenRecord {
    /// Upstream tokens backing this credential
    pub upstream: UpstreamToken,
    /// Resolved GitHub user
    pub user: UserIdentity,
    /// Proxy-owned expiry, independent of the upstream expiry
    pub expires_at: DateTime<Utc>,
}

impl AccessTokenRecord {
    /// Whether the token is past its expiry at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Principal resolved from this record
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal {
            login: self.user.login.clone(),
            id: self.user.id,
            upstream_access_token: self.upstream.access_token.clone(),
        }
    }
}

/// Credential allowing a new access token without a fresh OAuth dance
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    /// Upstream refresh token
    pub upstream_refresh_token: String,
    /// Resolved GitHub user
    pub user: UserIdentity,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Query parameters of `GET /oauth/authorize`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    /// Client CSRF state
    #[serde(default)]
    pub state: String,
    /// Client redirect URI
    #[serde(default)]
    pub redirect_uri: String,
    /// PKCE code challenge (RFC 7636)
    #[serde(default)]
    pub code_challenge: String,
    /// PKCE code challenge method
    #[serde(default)]
    pub code_challenge_method: String,
}

/// Query parameters of `GET /oauth/callback`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackRequest {
    /// Upstream authorization code
    #[serde(default)]
    pub code: String,
    /// Internal state id
    #[serde(default)]
    pub state: String,
    /// Upstream error code
    pub error: Option<String>,
    /// Upstream error description
    pub error_description: Option<String>,
}

/// Form body of `POST /oauth/token`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Grant type (`authorization_code`, `refresh_token`)
    #[serde(default)]
    pub grant_type: String,
    /// Authorization code (for `authorization_code` grant)
    #[serde(default)]
    pub code: String,
    /// Redirect URI (must match the one used at `/authorize`)
    #[serde(default)]
    pub redirect_uri: String,
    /// PKCE code verifier (for `authorization_code` grant)
    #[serde(default)]
    pub code_verifier: String,
    /// Refresh token (for `refresh_token` grant)
    #[serde(default)]
    pub refresh_token: String,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Proxy access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Expires in seconds
    pub expires_in: i64,
    /// Rotating refresh token
    pub refresh_token: String,
}

/// Authorization server metadata (RFC 8414)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    /// Issuer identifier
    pub issuer: String,
    /// Authorization endpoint
    pub authorization_endpoint: String,
    /// Token endpoint
    pub token_endpoint: String,
    /// Supported response types
    pub response_types_supported: Vec<String>,
    /// Supported grant types
    pub grant_types_supported: Vec<String>,
    /// Supported PKCE methods
    pub code_challenge_methods_supported: Vec<String>,
    /// Supported client authentication methods at the token endpoint
    pub token_endpoint_auth_methods_supported: Vec<String>,
}

/// Protected resource metadata (RFC 9728)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Resource identifier
    pub resource: String,
    /// Authorization servers able to issue tokens for this resource
    pub authorization_servers: Vec<String>,
}

/// OAuth 2.0 Error Response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    pub error_description: String,
}

impl OAuth2Error {
    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self {
            error: "invalid_request".to_owned(),
            error_description: description.to_owned(),
        }
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self {
            error: "invalid_grant".to_owned(),
            error_description: description.to_owned(),
        }
    }

    /// Create an `unsupported_grant_type` error
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self {
            error: "unsupported_grant_type".to_owned(),
            error_description: "Grant type not supported".to_owned(),
        }
    }

    /// Create a `server_error` error
    #[must_use]
    pub fn server_error(description: &str) -> Self {
        Self {
            error: "server_error".to_owned(),
            error_description: description.to_owned(),
        }
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.error == "server_error" {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> UpstreamToken {
        UpstreamToken {
            access_token: "gho_upstream".to_owned(),
            refresh_token: "ghr_upstream".to_owned(),
            expires_at: Utc::now() + Duration::hours(8),
        }
    }

    #[test]
    fn test_access_token_expiry_boundary() {
        let now = Utc::now();
        let record = AccessTokenRecord {
            upstream: upstream(),
            user: UserIdentity {
                login: "octocat".to_owned(),
                id: 1,
            },
            expires_at: now,
        };
        assert!(record.is_expired(now));
        assert!(!record.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn test_principal_debug_redacts_upstream_token() {
        let principal = Principal {
            login: "octocat".to_owned(),
            id: 1,
            upstream_access_token: "gho_secret".to_owned(),
        };
        let rendered = format!("{principal:?}");
        assert!(rendered.contains("octocat"));
        assert!(!rendered.contains("gho_secret"));
    }

    #[test]
    fn test_oauth_error_serialization() {
        let json = serde_json::to_value(OAuth2Error::invalid_grant("Invalid or expired code"))
            .unwrap();
        assert_eq!(json["error"], "invalid_grant");
        assert_eq!(json["error_description"], "Invalid or expired code");
        assert_eq!(
            OAuth2Error::unsupported_grant_type().status(),
            StatusCode::BAD_REQUEST
        );
    }
}

// ABOUTME: OAuth 2.0 authorization proxy issuing its own credentials on top of GitHub login
// ABOUTME: Implements authorize, callback and token (authorization_code, refresh_token) semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// NOTE: `.clone()` calls here hand owned strings to stored records and
// response structs; the store hands out owned copies.

use super::models::{
    AccessTokenRecord, AuthCode, AuthSession, AuthorizationServerMetadata, AuthorizeRequest,
    CallbackRequest, OAuth2Error, ProtectedResourceMetadata, RefreshTokenRecord, TokenRequest,
    TokenResponse, UserIdentity,
};
use super::pkce::verify_pkce;
use super::store::{CredentialStore, StoreError};
use crate::constants::oauth::{
    ACCESS_TOKEN_TTL_SECS, AUTH_CODE_TTL_SECS, GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN,
    PKCE_METHOD_S256, TOKEN_TYPE_BEARER,
};
use crate::errors::AppError;
use crate::oauth2_client::{UpstreamOAuthClient, UpstreamToken};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

/// Description returned for every rejected grant
const INVALID_GRANT_DESCRIPTION: &str = "Invalid or expired grant";

/// Browser-facing failures of `/oauth/authorize` and `/oauth/callback`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    /// `code_challenge_method` other than S256
    #[error("Only S256 code challenge method supported")]
    UnsupportedChallengeMethod,
    /// Missing or unparseable client redirect URI
    #[error("Invalid or missing redirect_uri")]
    InvalidRedirectUri,
    /// GitHub redirected back with an error
    #[error("GitHub OAuth error: {error} - {description}")]
    UpstreamDenied {
        /// Provider error code
        error: String,
        /// Provider error description
        description: String,
    },
    /// Unknown, consumed or expired internal state id
    #[error("Invalid or expired state")]
    InvalidState,
    /// Callback without an upstream code
    #[error("Missing authorization code")]
    MissingCode,
    /// Upstream code exchange failed
    #[error("Failed to exchange code with GitHub")]
    CodeExchangeFailed,
    /// Upstream user lookup failed
    #[error("Failed to get GitHub user")]
    UserLookupFailed,
    /// Upstream organization lookup failed
    #[error("Failed to verify organization membership")]
    OrganizationLookupFailed,
    /// User is not in the allowed organization
    #[error("Access denied: membership in the {organization} organization is required")]
    NotOrganizationMember {
        /// Required organization
        organization: String,
    },
    /// Random source or other server failure
    #[error("Internal server error")]
    Internal,
}

impl From<AuthorizationError> for AppError {
    fn from(err: AuthorizationError) -> Self {
        let message = err.to_string();
        match err {
            AuthorizationError::UnsupportedChallengeMethod
            | AuthorizationError::InvalidRedirectUri
            | AuthorizationError::UpstreamDenied { .. }
            | AuthorizationError::InvalidState
            | AuthorizationError::MissingCode => Self::invalid_input(message),
            AuthorizationError::NotOrganizationMember { .. } => Self::permission_denied(message),
            AuthorizationError::CodeExchangeFailed
            | AuthorizationError::UserLookupFailed
            | AuthorizationError::OrganizationLookupFailed
            | AuthorizationError::Internal => Self::internal(message),
        }
    }
}

/// Internal reason a grant was rejected; logged, never returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantRejection {
    UnknownCode,
    CodeExpired,
    RedirectMismatch,
    PkceMismatch,
    UnknownRefreshToken,
    UpstreamRefreshFailed,
    RefreshTokenAlreadyRotated,
}

impl GrantRejection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownCode => "unknown_or_consumed_code",
            Self::CodeExpired => "code_expired",
            Self::RedirectMismatch => "redirect_uri_mismatch",
            Self::PkceMismatch => "pkce_verification_failed",
            Self::UnknownRefreshToken => "unknown_refresh_token",
            Self::UpstreamRefreshFailed => "upstream_refresh_failed",
            Self::RefreshTokenAlreadyRotated => "refresh_token_already_rotated",
        }
    }

    fn reject(self, user: Option<&str>) -> OAuth2Error {
        warn!(
            reason = self.as_str(),
            user = user.unwrap_or("-"),
            "Token grant rejected"
        );
        OAuth2Error::invalid_grant(INVALID_GRANT_DESCRIPTION)
    }
}

/// OAuth 2.0 authorization server proxying GitHub
///
/// Issues its own opaque state ids, codes, access tokens and refresh tokens
/// while GitHub performs the actual user authentication.
pub struct AuthorizationProxy {
    store: Arc<CredentialStore>,
    upstream: Arc<dyn UpstreamOAuthClient>,
    base_url: String,
    allowed_organization: Option<String>,
    auth_session_ttl: Duration,
}

impl AuthorizationProxy {
    /// Create a proxy over `store` and `upstream`
    #[must_use]
    pub fn new(
        store: Arc<CredentialStore>,
        upstream: Arc<dyn UpstreamOAuthClient>,
        base_url: impl Into<String>,
        allowed_organization: Option<String>,
        auth_session_ttl: StdDuration,
    ) -> Self {
        Self {
            store,
            upstream,
            base_url: base_url.into(),
            allowed_organization,
            auth_session_ttl: Duration::from_std(auth_session_ttl)
                .unwrap_or_else(|_| Duration::seconds(AUTH_CODE_TTL_SECS)),
        }
    }

    /// Credential store backing this proxy
    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// RFC 8414 metadata document
    #[must_use]
    pub fn authorization_server_metadata(&self) -> AuthorizationServerMetadata {
        AuthorizationServerMetadata {
            issuer: self.base_url.clone(),
            authorization_endpoint: format!("{}/oauth/authorize", self.base_url),
            token_endpoint: format!("{}/oauth/token", self.base_url),
            response_types_supported: vec!["code".to_owned()],
            grant_types_supported: vec![
                GRANT_AUTHORIZATION_CODE.to_owned(),
                GRANT_REFRESH_TOKEN.to_owned(),
            ],
            code_challenge_methods_supported: vec![PKCE_METHOD_S256.to_owned()],
            token_endpoint_auth_methods_supported: vec!["none".to_owned()],
        }
    }

    /// RFC 9728 metadata document
    #[must_use]
    pub fn protected_resource_metadata(&self) -> ProtectedResourceMetadata {
        ProtectedResourceMetadata {
            resource: self.base_url.clone(),
            authorization_servers: vec![self.base_url.clone()],
        }
    }

    /// Handle `GET /oauth/authorize`; returns the GitHub redirect URL
    ///
    /// # Errors
    ///
    /// Returns an error for a non-S256 challenge method, a bad redirect URI,
    /// or a random source failure
    pub fn authorize(&self, request: AuthorizeRequest) -> Result<String, AuthorizationError> {
        if !request.code_challenge_method.is_empty()
            && request.code_challenge_method != PKCE_METHOD_S256
        {
            return Err(AuthorizationError::UnsupportedChallengeMethod);
        }
        if Url::parse(&request.redirect_uri).is_err() {
            return Err(AuthorizationError::InvalidRedirectUri);
        }

        let has_pkce = !request.code_challenge.is_empty();
        let redirect_uri = request.redirect_uri.clone();
        let internal_state = self
            .store
            .auth_sessions()
            .insert(AuthSession {
                client_state: request.state,
                redirect_uri: request.redirect_uri,
                code_challenge: request.code_challenge,
                code_challenge_method: request.code_challenge_method,
                created_at: Utc::now(),
            })
            .map_err(|e| {
                error!(error = %e, "Failed to create auth session");
                AuthorizationError::Internal
            })?;

        info!(redirect_uri = %redirect_uri, has_pkce, "Starting OAuth flow");

        Ok(self
            .upstream
            .authorize_url(&internal_state, &format!("{}/oauth/callback", self.base_url)))
    }

    /// Handle `GET /oauth/callback`; returns the client redirect URL
    ///
    /// # Errors
    ///
    /// Returns an error if GitHub reported an error, the state is unknown or
    /// expired, any upstream call fails, or the user is not in the allowed
    /// organization
    pub async fn callback(&self, request: CallbackRequest) -> Result<String, AuthorizationError> {
        if let Some(upstream_error) = request.error.filter(|e| !e.is_empty()) {
            let description = request.error_description.unwrap_or_default();
            error!(error = %upstream_error, description = %description, "GitHub OAuth error");
            return Err(AuthorizationError::UpstreamDenied {
                error: upstream_error,
                description,
            });
        }

        let session = self
            .store
            .auth_sessions()
            .take(&request.state)
            .map_err(|e| {
                warn!(error = %e, "Callback with unknown state");
                AuthorizationError::InvalidState
            })?;
        if session.is_expired(Utc::now(), self.auth_session_ttl) {
            warn!(redirect_uri = %session.redirect_uri, "Callback for expired auth session");
            return Err(AuthorizationError::InvalidState);
        }
        if request.code.is_empty() {
            return Err(AuthorizationError::MissingCode);
        }

        let upstream = self.upstream.exchange_code(&request.code).await.map_err(|e| {
            error!(error = %e, "Failed to exchange code with GitHub");
            AuthorizationError::CodeExchangeFailed
        })?;
        let user = self
            .upstream
            .get_user(&upstream.access_token)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to get GitHub user");
                AuthorizationError::UserLookupFailed
            })?;
        self.check_organization(&upstream.access_token, &user.login)
            .await?;

        info!(login = %user.login, id = user.id, "User authenticated");

        let code = self
            .store
            .auth_codes()
            .insert(AuthCode {
                upstream,
                code_challenge: session.code_challenge,
                redirect_uri: session.redirect_uri.clone(),
                user: UserIdentity {
                    login: user.login,
                    id: user.id,
                },
                created_at: Utc::now(),
            })
            .map_err(|e| {
                error!(error = %e, "Failed to issue authorization code");
                AuthorizationError::Internal
            })?;

        let mut redirect =
            Url::parse(&session.redirect_uri).map_err(|_| AuthorizationError::InvalidRedirectUri)?;
        {
            let mut query = redirect.query_pairs_mut();
            query.append_pair("code", &code);
            if !session.client_state.is_empty() {
                query.append_pair("state", &session.client_state);
            }
        }
        Ok(redirect.into())
    }

    async fn check_organization(
        &self,
        access_token: &str,
        login: &str,
    ) -> Result<(), AuthorizationError> {
        let Some(required) = self.allowed_organization.as_deref() else {
            return Ok(());
        };

        let organizations = self
            .upstream
            .get_user_organizations(access_token)
            .await
            .map_err(|e| {
                error!(error = %e, login, "Failed to list GitHub organizations");
                AuthorizationError::OrganizationLookupFailed
            })?;

        if organizations
            .iter()
            .any(|org| org.login.eq_ignore_ascii_case(required))
        {
            Ok(())
        } else {
            warn!(login, organization = required, "User is not an organization member");
            Err(AuthorizationError::NotOrganizationMember {
                organization: required.to_owned(),
            })
        }
    }

    /// Handle `POST /oauth/token`
    ///
    /// # Errors
    ///
    /// Returns `unsupported_grant_type` for unknown grants and `invalid_grant`
    /// for every rejected grant, including a missing code or refresh token
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        match request.grant_type.as_str() {
            GRANT_AUTHORIZATION_CODE => self.redeem_authorization_code(&request),
            GRANT_REFRESH_TOKEN => self.redeem_refresh_token(&request).await,
            other => {
                warn!(grant_type = other, "Unsupported grant type");
                Err(OAuth2Error::unsupported_grant_type())
            }
        }
    }

    fn redeem_authorization_code(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        // Single use: the code is gone from here on, whatever the outcome
        let code = self
            .store
            .auth_codes()
            .take(&request.code)
            .map_err(|_| GrantRejection::UnknownCode.reject(None))?;
        let login = Some(code.user.login.as_str());

        if code.is_expired(Utc::now(), Duration::seconds(AUTH_CODE_TTL_SECS)) {
            return Err(GrantRejection::CodeExpired.reject(login));
        }
        if code.redirect_uri != request.redirect_uri {
            return Err(GrantRejection::RedirectMismatch.reject(login));
        }
        if !verify_pkce(&request.code_verifier, &code.code_challenge) {
            return Err(GrantRejection::PkceMismatch.reject(login));
        }

        let refresh_token = self
            .store
            .refresh_tokens()
            .insert(RefreshTokenRecord {
                upstream_refresh_token: code.upstream.refresh_token.clone(),
                user: code.user.clone(),
                created_at: Utc::now(),
            })
            .map_err(store_failure)?;
        let response = self.issue_access_token(code.upstream, code.user, refresh_token)?;
        Ok(response)
    }

    async fn redeem_refresh_token(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let record = self
            .store
            .refresh_tokens()
            .get(&request.refresh_token)
            .map_err(|_| GrantRejection::UnknownRefreshToken.reject(None))?;
        let login = Some(record.user.login.as_str());

        // The old refresh token survives an upstream failure
        let upstream = self
            .upstream
            .refresh_token(&record.upstream_refresh_token)
            .await
            .map_err(|e| {
                error!(error = %e, "GitHub token refresh failed");
                GrantRejection::UpstreamRefreshFailed.reject(login)
            })?;

        let upstream_refresh_token = if upstream.refresh_token.is_empty() {
            record.upstream_refresh_token.clone()
        } else {
            upstream.refresh_token.clone()
        };
        let new_refresh_token = self
            .store
            .rotate_refresh_token(
                &request.refresh_token,
                RefreshTokenRecord {
                    upstream_refresh_token,
                    user: record.user.clone(),
                    created_at: Utc::now(),
                },
            )
            .map_err(|e| match e {
                StoreError::NotFound { .. } => {
                    GrantRejection::RefreshTokenAlreadyRotated.reject(login)
                }
                StoreError::RandomSource => store_failure(e),
            })?;

        info!(user = %record.user.login, "Token refreshed");
        self.issue_access_token(upstream, record.user, new_refresh_token)
    }

    fn issue_access_token(
        &self,
        upstream: UpstreamToken,
        user: UserIdentity,
        refresh_token: String,
    ) -> Result<TokenResponse, OAuth2Error> {
        let login = user.login.clone();
        let access_token = self
            .store
            .access_tokens()
            .insert(AccessTokenRecord {
                upstream,
                user,
                expires_at: Utc::now() + Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            })
            .map_err(store_failure)?;

        info!(user = %login, expires_in = ACCESS_TOKEN_TTL_SECS, "Token issued");

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            expires_in: ACCESS_TOKEN_TTL_SECS,
            refresh_token,
        })
    }
}

fn store_failure(err: StoreError) -> OAuth2Error {
    error!(error = %err, "Credential store failure while issuing tokens");
    OAuth2Error::server_error("Failed to issue credentials")
}

// ABOUTME: Upstream GitHub OAuth client used by the authorization proxy
// ABOUTME: Exchanges codes and refresh tokens, fetches the user and their organizations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::GitHubConfig;
use crate::constants::github;
use crate::constants::protocol::{SERVER_NAME, SERVER_VERSION};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{header, Client, ClientBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration as StdDuration;
use thiserror::Error;
use url::Url;

/// Tokens obtained from the upstream provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamToken {
    /// Upstream access token
    pub access_token: String,
    /// Upstream refresh token (empty when the provider issues none)
    pub refresh_token: String,
    /// Upstream expiry
    pub expires_at: DateTime<Utc>,
}

/// Authenticated GitHub user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    /// Numeric user id
    pub id: i64,
    /// Login name
    pub login: String,
    /// Public email, if any
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, if any
    #[serde(default)]
    pub name: Option<String>,
}

/// GitHub organization membership entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubOrganization {
    /// Numeric organization id
    pub id: i64,
    /// Organization login
    pub login: String,
}

/// Upstream call failures
///
/// These are logged by the proxy and never shown to clients verbatim.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network or TLS failure
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status from the API
    #[error("upstream returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },
    /// OAuth error reported in a token response body
    #[error("upstream oauth error: {error} - {description}")]
    OAuth {
        /// Provider error code
        error: String,
        /// Provider error description
        description: String,
    },
    /// Response body did not match the expected shape
    #[error("upstream response malformed: {0}")]
    Malformed(String),
}

/// Result alias for upstream calls
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Identity provider operations the authorization proxy depends on
#[async_trait]
pub trait UpstreamOAuthClient: Send + Sync {
    /// Browser redirect target for `/oauth/authorize`, carrying the internal state id
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Exchange an upstream authorization code for tokens
    async fn exchange_code(&self, code: &str) -> UpstreamResult<UpstreamToken>;

    /// Obtain fresh upstream tokens from an upstream refresh token
    async fn refresh_token(&self, refresh_token: &str) -> UpstreamResult<UpstreamToken>;

    /// Fetch the user owning `access_token`
    async fn get_user(&self, access_token: &str) -> UpstreamResult<GitHubUser>;

    /// Fetch the organizations the user belongs to
    async fn get_user_organizations(
        &self,
        access_token: &str,
    ) -> UpstreamResult<Vec<GitHubOrganization>>;
}

/// Raw token endpoint body; GitHub reports errors with HTTP 200
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

impl TokenEndpointResponse {
    fn into_token(self, now: DateTime<Utc>) -> UpstreamResult<UpstreamToken> {
        if !self.error.is_empty() {
            return Err(UpstreamError::OAuth {
                error: self.error,
                description: self.error_description,
            });
        }
        if self.access_token.is_empty() {
            return Err(UpstreamError::Malformed(
                "token response without access_token".to_owned(),
            ));
        }
        let ttl = if self.expires_in > 0 {
            self.expires_in
        } else {
            github::DEFAULT_TOKEN_TTL_SECS
        };
        Ok(UpstreamToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(ttl),
        })
    }
}

/// GitHub OAuth app client on `reqwest`
pub struct GitHubClient {
    client_id: String,
    client_secret: String,
    api_base_url: String,
    http: Client,
}

impl GitHubClient {
    /// Create a client for the configured GitHub OAuth app
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(config: &GitHubConfig) -> UpstreamResult<Self> {
        let http = ClientBuilder::new()
            .timeout(StdDuration::from_secs(github::REQUEST_TIMEOUT_SECS))
            .user_agent(format!("{SERVER_NAME}/{SERVER_VERSION}"))
            .build()?;
        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_base_url: github::API_BASE_URL.to_owned(),
            http,
        })
    }

    async fn post_token_form(&self, params: &[(&str, &str)]) -> UpstreamResult<UpstreamToken> {
        let response = self
            .http
            .post(github::TOKEN_URL)
            .header(header::ACCEPT, "application/json")
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str::<TokenEndpointResponse>(&body) {
            Ok(parsed) => parsed.into_token(Utc::now()),
            Err(_) if !status.is_success() => Err(UpstreamError::Status {
                status: status.as_u16(),
            }),
            Err(e) => Err(UpstreamError::Malformed(e.to_string())),
        }
    }

    async fn get_api<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> UpstreamResult<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.api_base_url))
            .bearer_auth(access_token)
            .header(header::ACCEPT, github::API_ACCEPT)
            .header("X-GitHub-Api-Version", github::API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl UpstreamOAuthClient for GitHubClient {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        match Url::parse(github::AUTHORIZE_URL) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("client_id", &self.client_id)
                    .append_pair("redirect_uri", redirect_uri)
                    .append_pair("state", state)
                    .append_pair("scope", github::SCOPES);
                url.into()
            }
            Err(_) => github::AUTHORIZE_URL.to_owned(),
        }
    }

    async fn exchange_code(&self, code: &str) -> UpstreamResult<UpstreamToken> {
        self.post_token_form(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> UpstreamResult<UpstreamToken> {
        self.post_token_form(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn get_user(&self, access_token: &str) -> UpstreamResult<GitHubUser> {
        self.get_api("/user", access_token).await
    }

    async fn get_user_organizations(
        &self,
        access_token: &str,
    ) -> UpstreamResult<Vec<GitHubOrganization>> {
        self.get_api("/user/orgs", access_token).await
    }
}

// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scripted GitHub upstream, server fixtures and OAuth flow helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `mcp_hello_world`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration, Utc};
use mcp_hello_world::{
    config::{GitHubConfig, ServerConfig},
    mcp::resources::ServerResources,
    oauth2_client::{
        GitHubOrganization, GitHubUser, UpstreamError, UpstreamOAuthClient, UpstreamResult,
        UpstreamToken,
    },
    oauth2_server::{models::AccessTokenRecord, models::UserIdentity, s256_challenge},
    server::build_router,
};
use std::env;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tracing::Level;
use url::Url;

static INIT_LOGGER: Once = Once::new();

/// Redirect URI registered by the test client
pub const CLIENT_REDIRECT: &str = "http://localhost:3000/callback";

/// PKCE verifier used by the happy-path flows
pub const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

/// Organization the default fixture requires
pub const ORGANIZATION: &str = "navikt";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Scripted stand-in for GitHub
pub struct MockUpstream {
    user: GitHubUser,
    organizations: Vec<GitHubOrganization>,
    fail_exchange: AtomicBool,
    fail_refresh: AtomicBool,
    exchange_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl MockUpstream {
    /// Member of the default organization
    pub fn member() -> Self {
        Self::with_organizations(&[ORGANIZATION, "other-org"])
    }

    /// User belonging to exactly `organizations`
    pub fn with_organizations(organizations: &[&str]) -> Self {
        Self {
            user: GitHubUser {
                id: 4242,
                login: "octocat".to_owned(),
                email: Some("octocat@example.com".to_owned()),
                name: Some("Mona Octocat".to_owned()),
            },
            organizations: organizations
                .iter()
                .enumerate()
                .map(|(i, login)| GitHubOrganization {
                    id: i as i64 + 1,
                    login: (*login).to_owned(),
                })
                .collect(),
            fail_exchange: AtomicBool::new(false),
            fail_refresh: AtomicBool::new(false),
            exchange_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    /// Make every code exchange fail
    pub fn fail_exchange(&self, fail: bool) {
        self.fail_exchange.store(fail, Ordering::SeqCst);
    }

    /// Make every token refresh fail
    pub fn fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// Number of refresh calls seen
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamOAuthClient for MockUpstream {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        Url::parse_with_params(
            "https://github.test/login/oauth/authorize",
            &[
                ("client_id", "test-client"),
                ("redirect_uri", redirect_uri),
                ("state", state),
            ],
        )
        .unwrap()
        .into()
    }

    async fn exchange_code(&self, code: &str) -> UpstreamResult<UpstreamToken> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchange.load(Ordering::SeqCst) {
            return Err(UpstreamError::OAuth {
                error: "bad_verification_code".to_owned(),
                description: "The code passed is incorrect or expired.".to_owned(),
            });
        }
        Ok(UpstreamToken {
            access_token: format!("gho_{code}"),
            refresh_token: "ghr_initial".to_owned(),
            expires_at: Utc::now() + Duration::hours(8),
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> UpstreamResult<UpstreamToken> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(UpstreamError::OAuth {
                error: "bad_refresh_token".to_owned(),
                description: format!("{refresh_token} was rejected"),
            });
        }
        Ok(UpstreamToken {
            access_token: format!("gho_refreshed_{n}"),
            refresh_token: format!("ghr_{n}"),
            expires_at: Utc::now() + Duration::hours(8),
        })
    }

    async fn get_user(&self, _access_token: &str) -> UpstreamResult<GitHubUser> {
        Ok(self.user.clone())
    }

    async fn get_user_organizations(
        &self,
        _access_token: &str,
    ) -> UpstreamResult<Vec<GitHubOrganization>> {
        Ok(self.organizations.clone())
    }
}

/// Configuration pointing at `http://localhost:8080` and requiring [`ORGANIZATION`]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        github: GitHubConfig {
            client_id: "test-client".to_owned(),
            client_secret: "test-secret".to_owned(),
            allowed_organization: Some(ORGANIZATION.to_owned()),
        },
        ..ServerConfig::default()
    }
}

/// Resources over `upstream` with [`test_config`]
pub fn create_test_resources(upstream: Arc<MockUpstream>) -> Arc<ServerResources> {
    create_test_resources_with_config(test_config(), upstream)
}

/// Resources over `upstream` with an explicit configuration
pub fn create_test_resources_with_config(
    config: ServerConfig,
    upstream: Arc<MockUpstream>,
) -> Arc<ServerResources> {
    init_test_logging();
    Arc::new(ServerResources::new(config, upstream))
}

/// Full application router plus the resources behind it
pub fn create_test_app() -> (Router, Arc<ServerResources>, Arc<MockUpstream>) {
    let upstream = Arc::new(MockUpstream::member());
    let resources = create_test_resources(Arc::clone(&upstream));
    (build_router(&resources), resources, upstream)
}

/// PKCE challenge for [`VERIFIER`]
pub fn challenge() -> String {
    s256_challenge(VERIFIER)
}

/// Value of query parameter `name` in `url`
pub fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Mint an access token straight into the store, bypassing the OAuth dance
pub fn issue_access_token(resources: &ServerResources, login: &str) -> String {
    resources
        .store
        .access_tokens()
        .insert(AccessTokenRecord {
            upstream: UpstreamToken {
                access_token: "gho_direct".to_owned(),
                refresh_token: String::new(),
                expires_at: Utc::now() + Duration::hours(8),
            },
            user: UserIdentity {
                login: login.to_owned(),
                id: 7,
            },
            expires_at: Utc::now() + Duration::hours(1),
        })
        .unwrap()
}

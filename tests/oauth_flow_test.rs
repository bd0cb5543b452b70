// ABOUTME: Integration tests for the GitHub-backed OAuth 2.0 authorization proxy
// ABOUTME: Covers authorize/callback redirects, code redemption, PKCE, refresh rotation and CORS
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::{http::StatusCode, Router};
use chrono::{Duration, Utc};
use common::{
    challenge, create_test_app, create_test_resources, query_param, MockUpstream, CLIENT_REDIRECT,
    VERIFIER,
};
use helpers::axum_test::{AxumTestRequest, AxumTestResponse};
use mcp_hello_world::oauth2_client::UpstreamToken;
use mcp_hello_world::oauth2_server::models::{
    AuthCode, AuthSession, OAuth2Error, TokenResponse, UserIdentity,
};
use mcp_hello_world::server::build_router;
use serde_json::{json, Value};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn authorize_uri(params: &[(&str, &str)]) -> String {
    format!(
        "/oauth/authorize?{}",
        serde_urlencoded::to_string(params).unwrap()
    )
}

/// Run `/oauth/authorize` and return the internal state sent to GitHub
async fn start_flow(app: &Router, client_state: &str) -> String {
    let challenge = challenge();
    let response = AxumTestRequest::get(&authorize_uri(&[
        ("state", client_state),
        ("redirect_uri", CLIENT_REDIRECT),
        ("code_challenge", challenge.as_str()),
        ("code_challenge_method", "S256"),
    ]))
    .send(app.clone())
    .await
    .assert_status(StatusCode::FOUND);

    query_param(&response.location(), "state").expect("GitHub redirect carries a state")
}

async fn callback(app: &Router, upstream_code: &str, internal_state: &str) -> AxumTestResponse {
    let query = serde_urlencoded::to_string([("code", upstream_code), ("state", internal_state)])
        .unwrap();
    AxumTestRequest::get(&format!("/oauth/callback?{query}"))
        .send(app.clone())
        .await
}

/// Complete authorize + callback and return the proxy-issued code
async fn login(app: &Router) -> String {
    let internal_state = start_flow(app, "client-xyz").await;
    let response = callback(app, "upstream-code", &internal_state)
        .await
        .assert_status(StatusCode::FOUND);
    query_param(&response.location(), "code").expect("client redirect carries a code")
}

async fn redeem(app: &Router, code: &str, verifier: &str) -> AxumTestResponse {
    AxumTestRequest::post("/oauth/token")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", CLIENT_REDIRECT),
            ("code_verifier", verifier),
        ])
        .send(app.clone())
        .await
}

async fn refresh(app: &Router, refresh_token: &str) -> AxumTestResponse {
    AxumTestRequest::post("/oauth/token")
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send(app.clone())
        .await
}

fn assert_invalid_grant(response: AxumTestResponse) {
    let error: OAuth2Error = response.assert_status(StatusCode::BAD_REQUEST).json();
    assert_eq!(error.error, "invalid_grant");
}

// ============================================================================
// Authorize and Callback
// ============================================================================

#[tokio::test]
async fn test_authorize_redirects_to_github_with_internal_state() {
    let (app, resources, _) = create_test_app();

    let internal_state = start_flow(&app, "client-xyz").await;

    assert_ne!(internal_state, "client-xyz");
    assert!(internal_state.len() >= 43);
    assert_eq!(resources.store.auth_sessions().len(), 1);
    let session = resources.store.auth_sessions().get(&internal_state).unwrap();
    assert_eq!(session.client_state, "client-xyz");
    assert_eq!(session.redirect_uri, CLIENT_REDIRECT);
}

#[tokio::test]
async fn test_authorize_passes_callback_url_upstream() {
    let (app, _, _) = create_test_app();

    let response = AxumTestRequest::get(&authorize_uri(&[
        ("state", "s"),
        ("redirect_uri", CLIENT_REDIRECT),
    ]))
    .send(app)
    .await
    .assert_status(StatusCode::FOUND);

    let location = response.location();
    assert!(location.starts_with("https://github.test/login/oauth/authorize"));
    assert_eq!(
        query_param(&location, "redirect_uri").as_deref(),
        Some("http://localhost:8080/oauth/callback")
    );
}

#[tokio::test]
async fn test_authorize_rejects_plain_challenge_method() {
    let (app, resources, _) = create_test_app();

    AxumTestRequest::get(&authorize_uri(&[
        ("state", "s"),
        ("redirect_uri", CLIENT_REDIRECT),
        ("code_challenge", "abc"),
        ("code_challenge_method", "plain"),
    ]))
    .send(app)
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    assert!(resources.store.auth_sessions().is_empty());
}

#[tokio::test]
async fn test_authorize_rejects_missing_redirect_uri() {
    let (app, _, _) = create_test_app();

    AxumTestRequest::get(&authorize_uri(&[("state", "s")]))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_redirects_to_client_with_code_and_client_state() {
    let (app, resources, _) = create_test_app();
    let internal_state = start_flow(&app, "client-xyz").await;

    let response = callback(&app, "upstream-code", &internal_state)
        .await
        .assert_status(StatusCode::FOUND);

    let location = response.location();
    assert!(location.starts_with(CLIENT_REDIRECT));
    assert_eq!(query_param(&location, "state").as_deref(), Some("client-xyz"));
    let code = query_param(&location, "code").unwrap();
    assert_ne!(code, "upstream-code");

    // Session consumed, code recorded
    assert!(resources.store.auth_sessions().is_empty());
    let record = resources.store.auth_codes().get(&code).unwrap();
    assert_eq!(record.user.login, "octocat");
    assert_eq!(record.upstream.access_token, "gho_upstream-code");
}

#[tokio::test]
async fn test_callback_state_is_single_use() {
    let (app, _, _) = create_test_app();
    let internal_state = start_flow(&app, "client-xyz").await;

    callback(&app, "upstream-code", &internal_state)
        .await
        .assert_status(StatusCode::FOUND);
    callback(&app, "upstream-code", &internal_state)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejects_unknown_state() {
    let (app, _, _) = create_test_app();

    callback(&app, "upstream-code", "not-a-real-state")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_rejects_expired_auth_session() {
    let (app, resources, _) = create_test_app();
    resources.store.auth_sessions().save(
        "stale-state",
        AuthSession {
            client_state: "client-xyz".to_owned(),
            redirect_uri: CLIENT_REDIRECT.to_owned(),
            code_challenge: String::new(),
            code_challenge_method: String::new(),
            created_at: Utc::now() - Duration::minutes(11),
        },
    );

    callback(&app, "upstream-code", "stale-state")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_reports_upstream_error() {
    let (app, _, _) = create_test_app();
    let query = serde_urlencoded::to_string([
        ("error", "access_denied"),
        ("error_description", "The user has denied your application access."),
    ])
    .unwrap();

    let body: Value = AxumTestRequest::get(&format!("/oauth/callback?{query}"))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();

    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("access_denied"));
}

#[tokio::test]
async fn test_callback_code_exchange_failure_is_server_error() {
    let (app, _, upstream) = create_test_app();
    upstream.fail_exchange(true);
    let internal_state = start_flow(&app, "client-xyz").await;

    callback(&app, "upstream-code", &internal_state)
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_callback_denies_non_members() {
    let upstream = Arc::new(MockUpstream::with_organizations(&["some-other-org"]));
    let resources = create_test_resources(upstream);
    let app = build_router(&resources);
    let internal_state = start_flow(&app, "client-xyz").await;

    callback(&app, "upstream-code", &internal_state)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert!(resources.store.auth_codes().is_empty());
}

#[tokio::test]
async fn test_organization_match_is_case_insensitive() {
    let upstream = Arc::new(MockUpstream::with_organizations(&["NAVIKT"]));
    let resources = create_test_resources(upstream);
    let app = build_router(&resources);
    let internal_state = start_flow(&app, "client-xyz").await;

    callback(&app, "upstream-code", &internal_state)
        .await
        .assert_status(StatusCode::FOUND);
}

// ============================================================================
// Authorization Code Grant
// ============================================================================

#[tokio::test]
async fn test_full_flow_issues_working_bearer_token() {
    let (app, _, _) = create_test_app();
    let code = login(&app).await;

    let tokens: TokenResponse = redeem(&app, &code, VERIFIER)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(tokens.token_type, "Bearer");
    assert_eq!(tokens.expires_in, 3600);
    assert!(!tokens.refresh_token.is_empty());
    assert_ne!(tokens.access_token, "gho_upstream-code");

    let body: Value = AxumTestRequest::post("/mcp")
        .bearer(&tokens.access_token)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "whoami", "arguments": {}}
        }))
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("octocat"));
    assert!(text.contains("4242"));
}

#[tokio::test]
async fn test_code_cannot_be_redeemed_twice() {
    let (app, _, _) = create_test_app();
    let code = login(&app).await;

    redeem(&app, &code, VERIFIER)
        .await
        .assert_status(StatusCode::OK);
    assert_invalid_grant(redeem(&app, &code, VERIFIER).await);
}

#[tokio::test]
async fn test_concurrent_redemption_succeeds_exactly_once() {
    let (app, _, _) = create_test_app();
    let code = login(&app).await;

    let (first, second) = tokio::join!(
        redeem(&app, &code, VERIFIER),
        redeem(&app, &code, VERIFIER)
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 400]);
}

#[tokio::test]
async fn test_wrong_verifier_consumes_code() {
    let (app, _, _) = create_test_app();
    let code = login(&app).await;

    assert_invalid_grant(redeem(&app, &code, "wrong-verifier-wrong-verifier-wrong-verifier").await);
    // Failed attempt still burns the code
    assert_invalid_grant(redeem(&app, &code, VERIFIER).await);
}

#[tokio::test]
async fn test_missing_verifier_with_recorded_challenge_fails() {
    let (app, _, _) = create_test_app();
    let code = login(&app).await;

    assert_invalid_grant(redeem(&app, &code, "").await);
}

#[tokio::test]
async fn test_redirect_uri_must_match() {
    let (app, _, _) = create_test_app();
    let code = login(&app).await;

    let response = AxumTestRequest::post("/oauth/token")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", "http://evil.example/callback"),
            ("code_verifier", VERIFIER),
        ])
        .send(app)
        .await;
    assert_invalid_grant(response);
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let (app, resources, _) = create_test_app();
    resources.store.auth_codes().save(
        "old-code",
        AuthCode {
            upstream: UpstreamToken {
                access_token: "gho_old".to_owned(),
                refresh_token: String::new(),
                expires_at: Utc::now(),
            },
            code_challenge: String::new(),
            redirect_uri: CLIENT_REDIRECT.to_owned(),
            user: UserIdentity {
                login: "octocat".to_owned(),
                id: 4242,
            },
            created_at: Utc::now() - Duration::minutes(11),
        },
    );

    assert_invalid_grant(redeem(&app, "old-code", "").await);
    assert!(resources.store.auth_codes().is_empty());
}

#[tokio::test]
async fn test_flow_without_pkce_passes() {
    let (app, _, _) = create_test_app();
    let response = AxumTestRequest::get(&authorize_uri(&[
        ("state", "no-pkce"),
        ("redirect_uri", CLIENT_REDIRECT),
    ]))
    .send(app.clone())
    .await;
    let internal_state = query_param(&response.location(), "state").unwrap();
    let response = callback(&app, "upstream-code", &internal_state).await;
    let code = query_param(&response.location(), "code").unwrap();

    redeem(&app, &code, "").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_missing_code_is_invalid_grant() {
    let (app, _, _) = create_test_app();
    login(&app).await;

    assert_invalid_grant(redeem(&app, "", VERIFIER).await);
}

#[tokio::test]
async fn test_unknown_grant_type() {
    let (app, _, _) = create_test_app();

    let error: OAuth2Error = AxumTestRequest::post("/oauth/token")
        .form(&[("grant_type", "password")])
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(error.error, "unsupported_grant_type");
}

#[tokio::test]
async fn test_json_token_body_is_invalid_request() {
    let (app, _, _) = create_test_app();

    let error: OAuth2Error = AxumTestRequest::post("/oauth/token")
        .json(&json!({"grant_type": "authorization_code", "code": "x"}))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(error.error, "invalid_request");
}

// ============================================================================
// Refresh Token Grant
// ============================================================================

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let (app, _, upstream) = create_test_app();
    let code = login(&app).await;
    let first: TokenResponse = redeem(&app, &code, VERIFIER).await.json();

    let second: TokenResponse = refresh(&app, &first.refresh_token)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_ne!(second.refresh_token, first.refresh_token);
    assert_ne!(second.access_token, first.access_token);
    assert_eq!(upstream.refresh_calls(), 1);

    // The old refresh token is gone and never reaches GitHub again
    assert_invalid_grant(refresh(&app, &first.refresh_token).await);
    assert_eq!(upstream.refresh_calls(), 1);
    // The new one works, and the first stays dead afterwards
    refresh(&app, &second.refresh_token)
        .await
        .assert_status(StatusCode::OK);
    assert_invalid_grant(refresh(&app, &first.refresh_token).await);
    assert_eq!(upstream.refresh_calls(), 2);
}

#[tokio::test]
async fn test_upstream_refresh_failure_keeps_old_token() {
    let (app, _, upstream) = create_test_app();
    let code = login(&app).await;
    let tokens: TokenResponse = redeem(&app, &code, VERIFIER).await.json();

    upstream.fail_refresh(true);
    assert_invalid_grant(refresh(&app, &tokens.refresh_token).await);

    upstream.fail_refresh(false);
    refresh(&app, &tokens.refresh_token)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_refresh_token() {
    let (app, _, upstream) = create_test_app();

    assert_invalid_grant(refresh(&app, "never-issued").await);
    assert_eq!(upstream.refresh_calls(), 0);
}

#[tokio::test]
async fn test_missing_refresh_token_is_invalid_grant() {
    let (app, _, upstream) = create_test_app();

    assert_invalid_grant(refresh(&app, "").await);
    assert_eq!(upstream.refresh_calls(), 0);
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_token_preflight() {
    let (app, _, _) = create_test_app();

    let response = AxumTestRequest::options("/oauth/token")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .send(app)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("*")
    );
    assert!(response
        .header("access-control-allow-methods")
        .unwrap()
        .contains("POST"));
    assert!(response
        .header("access-control-allow-headers")
        .unwrap()
        .contains("Authorization"));
}

#[tokio::test]
async fn test_token_errors_carry_cors_headers() {
    let (app, _, _) = create_test_app();

    let response = AxumTestRequest::post("/oauth/token")
        .form(&[("grant_type", "password")])
        .send(app)
        .await;

    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("*")
    );
}

#[tokio::test]
async fn test_browser_endpoints_have_no_cors_headers() {
    let (app, _, _) = create_test_app();

    let response = AxumTestRequest::get(&authorize_uri(&[
        ("state", "s"),
        ("redirect_uri", CLIENT_REDIRECT),
    ]))
    .send(app)
    .await;

    assert!(response.header("access-control-allow-origin").is_none());
}

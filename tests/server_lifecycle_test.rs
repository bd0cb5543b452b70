// ABOUTME: Integration tests for the served HTTP stack and background housekeeping
// ABOUTME: Binds a real listener, checks graceful shutdown and the credential sweeper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{create_test_resources_with_config, test_config, MockUpstream};
use mcp_hello_world::config::{ServerConfig, StoreConfig};
use mcp_hello_world::oauth2_server::models::AuthSession;
use mcp_hello_world::server::{spawn_credential_sweeper, McpHelloWorldServer};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

fn session(age: ChronoDuration) -> AuthSession {
    AuthSession {
        client_state: "client".to_owned(),
        redirect_uri: "http://localhost:3000/callback".to_owned(),
        code_challenge: String::new(),
        code_challenge_method: String::new(),
        created_at: Utc::now() - age,
    }
}

#[tokio::test]
#[serial]
async fn test_serve_answers_and_shuts_down_gracefully() {
    let resources =
        create_test_resources_with_config(test_config(), Arc::new(MockUpstream::member()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = resources.shutdown.clone();

    let server = tokio::spawn(McpHelloWorldServer::new(resources).serve(listener));

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");

    let unauthorized = reqwest::Client::new()
        .post(format!("http://{addr}/mcp"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status().as_u16(), 401);

    shutdown.cancel();
    let result = timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_sweeper_purges_expired_sessions() {
    let config = ServerConfig {
        store: StoreConfig {
            auth_session_ttl: Duration::from_secs(600),
            sweep_interval: Duration::from_millis(20),
        },
        ..test_config()
    };
    let resources = create_test_resources_with_config(config, Arc::new(MockUpstream::member()));
    resources
        .store
        .auth_sessions()
        .save("stale", session(ChronoDuration::minutes(11)));
    resources
        .store
        .auth_sessions()
        .save("fresh", session(ChronoDuration::zero()));

    let sweeper = spawn_credential_sweeper(&resources);
    timeout(Duration::from_secs(5), async {
        while resources.store.auth_sessions().get("stale").is_ok() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("stale session was never purged");
    assert!(resources.store.auth_sessions().get("fresh").is_ok());

    resources.shutdown.cancel();
    timeout(Duration::from_secs(5), sweeper)
        .await
        .expect("sweeper did not stop")
        .unwrap();
}

// ABOUTME: Environment-based configuration loading for the MCP hello-world server
// ABOUTME: Parses ports, base URL, GitHub credentials, session and store tuning from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Upstream GitHub OAuth application settings
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// OAuth app client id
    pub client_id: String,
    /// OAuth app client secret
    pub client_secret: String,
    /// Organization a user must belong to; `None` disables the check
    pub allowed_organization: Option<String>,
}

/// Bidirectional streaming session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between keepalive frames
    pub keepalive_interval: Duration,
    /// Close the session after this long without inbound messages
    pub idle_timeout: Option<Duration>,
    /// Bound of the inbound message queue
    pub channel_capacity: usize,
    /// Longest inbound line accepted; longer lines are skipped
    pub max_message_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(30),
            idle_timeout: None,
            channel_capacity: 64,
            max_message_bytes: 1024 * 1024,
        }
    }
}

/// Credential store housekeeping
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Pending `/authorize` flows older than this are rejected and swept
    pub auth_session_ttl: Duration,
    /// Interval of the background sweep
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auth_session_ttl: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Public base URL without a trailing slash
    pub base_url: String,
    /// Upstream identity provider
    pub github: GitHubConfig,
    /// Streaming session settings
    pub session: SessionConfig,
    /// Credential store housekeeping
    pub store: StoreConfig,
    /// Timeout for non-streaming requests
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is malformed or the base URL is invalid
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is malformed or the base URL is invalid
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let client_id = var_or("GITHUB_CLIENT_ID", "");
        let client_secret = var_or("GITHUB_CLIENT_SECRET", "");
        if client_id.is_empty() || client_secret.is_empty() {
            warn!("GITHUB_CLIENT_ID or GITHUB_CLIENT_SECRET not set, OAuth will not work");
        }
        let allowed_organization = Some(var_or("ALLOWED_ORGANIZATION", "navikt"))
            .map(|org| org.trim().to_owned())
            .filter(|org| !org.is_empty());

        let idle_timeout_secs: u64 = parse_var(&lookup, "SSE_IDLE_TIMEOUT_SECS", 0)?;

        let config = Self {
            http_port: parse_var(&lookup, "PORT", 8080)?,
            base_url: normalize_base_url(&var_or("BASE_URL", "http://localhost:8080")),
            github: GitHubConfig {
                client_id,
                client_secret,
                allowed_organization,
            },
            session: SessionConfig {
                keepalive_interval: Duration::from_secs(parse_var(
                    &lookup,
                    "SSE_KEEPALIVE_SECS",
                    30,
                )?),
                idle_timeout: (idle_timeout_secs > 0)
                    .then(|| Duration::from_secs(idle_timeout_secs)),
                channel_capacity: parse_var(&lookup, "SSE_CHANNEL_CAPACITY", 64)?,
                max_message_bytes: parse_var(&lookup, "SSE_MAX_MESSAGE_BYTES", 1024 * 1024)?,
            },
            store: StoreConfig {
                auth_session_ttl: Duration::from_secs(parse_var(
                    &lookup,
                    "AUTH_SESSION_TTL_SECS",
                    600,
                )?),
                sweep_interval: Duration::from_secs(parse_var(
                    &lookup,
                    "STORE_SWEEP_INTERVAL_SECS",
                    60,
                )?),
            },
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "HTTP_REQUEST_TIMEOUT_SECS",
                60,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL or a
    /// duration that drives a timer is zero
    pub fn validate(&self) -> AppResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| AppError::config(format!("BASE_URL is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::config("BASE_URL must use http or https"));
        }
        if self.session.keepalive_interval.is_zero() {
            return Err(AppError::config("SSE_KEEPALIVE_SECS must be greater than zero"));
        }
        if self.session.channel_capacity == 0 {
            return Err(AppError::config("SSE_CHANNEL_CAPACITY must be greater than zero"));
        }
        if self.session.max_message_bytes == 0 {
            return Err(AppError::config("SSE_MAX_MESSAGE_BYTES must be greater than zero"));
        }
        if self.store.sweep_interval.is_zero() {
            return Err(AppError::config(
                "STORE_SWEEP_INTERVAL_SECS must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Override the public base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "MCP Hello World Configuration:\n\
             - HTTP Port: {}\n\
             - Base URL: {}\n\
             - GitHub OAuth: {}\n\
             - Allowed Organization: {}\n\
             - SSE Keepalive: {}s\n\
             - Auth Session TTL: {}s",
            self.http_port,
            self.base_url,
            if self.github.client_id.is_empty() {
                "Disabled"
            } else {
                "Enabled"
            },
            self.github.allowed_organization.as_deref().unwrap_or("(any)"),
            self.session.keepalive_interval.as_secs(),
            self.store.auth_session_ttl.as_secs(),
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            base_url: "http://localhost:8080".to_owned(),
            github: GitHubConfig {
                client_id: String::new(),
                client_secret: String::new(),
                allowed_organization: None,
            },
            session: SessionConfig::default(),
            store: StoreConfig::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("{key} has invalid value '{raw}': {e}"))),
        _ => Ok(default),
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

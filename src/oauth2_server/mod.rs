// ABOUTME: OAuth 2.0 authorization server proxying GitHub for user authentication
// ABOUTME: Issues its own opaque codes and tokens, verifies PKCE and keeps credentials in memory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Authorization proxy: authorize, callback and token grants
pub mod endpoints;
/// OAuth 2.0 data models and types
pub mod models;
/// PKCE S256 verification
pub mod pkce;
/// Volatile credential store
pub mod store;

/// OAuth 2.0 authorization proxy
pub use endpoints::{AuthorizationError, AuthorizationProxy};

// OAuth 2.0 data models and request/response types

/// Authorization request
pub use models::AuthorizeRequest;
/// Callback request
pub use models::CallbackRequest;
/// OAuth 2.0 error response
pub use models::OAuth2Error;
/// Authenticated identity attached to protected requests
pub use models::Principal;
/// Token exchange request
pub use models::TokenRequest;
/// Token exchange response
pub use models::TokenResponse;

pub use pkce::{s256_challenge, verify_pkce};
pub use store::{CredentialKind, CredentialStore, PurgeStats, StoreError};

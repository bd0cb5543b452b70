// ABOUTME: Volatile concurrent credential store for OAuth sessions, codes and tokens
// ABOUTME: DashMap-backed tables with atomic take/rotate for exactly-once redemption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Credential Store
//!
//! Four independent tables, one per credential kind, each keyed by an opaque
//! random identifier. Every table operation is atomic per key: `take` and
//! `rotate` remove the entry and hand it back in one step, so two concurrent
//! redemptions of the same key can never both observe it.
//!
//! Expiry is the caller's business at read time; [`CredentialStore::purge_expired`]
//! only reclaims memory.

use super::models::{AccessTokenRecord, AuthCode, AuthSession, RefreshTokenRecord};
use crate::constants::oauth::{AUTH_CODE_BYTES, STATE_ID_BYTES, TOKEN_BYTES};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Credential kinds held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Pending `/authorize` flow
    AuthSession,
    /// Proxy-issued authorization code
    AuthCode,
    /// Proxy-issued access token
    AccessToken,
    /// Proxy-issued refresh token
    RefreshToken,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AuthSession => "auth session",
            Self::AuthCode => "authorization code",
            Self::AccessToken => "access token",
            Self::RefreshToken => "refresh token",
        };
        f.write_str(name)
    }
}

/// Credential store failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Key absent or already consumed
    #[error("{kind} not found")]
    NotFound {
        /// Table that missed
        kind: CredentialKind,
    },
    /// The system random source failed
    #[error("system random source failure")]
    RandomSource,
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Generate an opaque URL-safe identifier from `byte_len` secure random bytes
///
/// # Errors
///
/// Returns [`StoreError::RandomSource`] if the system RNG fails
pub fn generate_opaque_id(byte_len: usize) -> StoreResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; byte_len];
    rng.fill(&mut bytes).map_err(|e| {
        error!(
            "CRITICAL: SystemRandom failed - cannot generate secure random bytes: {}",
            e
        );
        StoreError::RandomSource
    })?;
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&bytes))
}

/// One credential table
pub struct CredentialTable<T> {
    kind: CredentialKind,
    id_bytes: usize,
    entries: DashMap<String, T>,
}

impl<T: Clone> CredentialTable<T> {
    fn new(kind: CredentialKind, id_bytes: usize) -> Self {
        Self {
            kind,
            id_bytes,
            entries: DashMap::new(),
        }
    }

    /// Store `value` under a freshly minted identifier and return the identifier
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RandomSource`] if no identifier could be generated
    pub fn insert(&self, value: T) -> StoreResult<String> {
        loop {
            let id = generate_opaque_id(self.id_bytes)?;
            if let Entry::Vacant(slot) = self.entries.entry(id.clone()) {
                slot.insert(value);
                return Ok(id);
            }
        }
    }

    /// Store `value` under a caller-chosen identifier, replacing any previous value
    pub fn save(&self, id: impl Into<String>, value: T) {
        self.entries.insert(id.into(), value);
    }

    /// Look up a record without consuming it
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the key is absent
    pub fn get(&self, id: &str) -> StoreResult<T> {
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { kind: self.kind })
    }

    /// Delete a record; returns whether it was present
    pub fn delete(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Remove and return a record in one atomic step
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the key is absent or was taken concurrently
    pub fn take(&self, id: &str) -> StoreResult<T> {
        self.entries
            .remove(id)
            .map(|(_, value)| value)
            .ok_or(StoreError::NotFound { kind: self.kind })
    }

    /// Number of records held
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn retain_where(&self, keep: impl Fn(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, value| keep(value));
        before.saturating_sub(self.entries.len())
    }
}

/// Records reclaimed by one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeStats {
    /// Expired pending flows removed
    pub auth_sessions: usize,
    /// Expired codes removed
    pub auth_codes: usize,
    /// Expired access tokens removed
    pub access_tokens: usize,
}

impl PurgeStats {
    /// Total records removed
    #[must_use]
    pub const fn total(&self) -> usize {
        self.auth_sessions + self.auth_codes + self.access_tokens
    }
}

/// Volatile store of every credential the proxy issues
pub struct CredentialStore {
    auth_sessions: CredentialTable<AuthSession>,
    auth_codes: CredentialTable<AuthCode>,
    access_tokens: CredentialTable<AccessTokenRecord>,
    refresh_tokens: CredentialTable<RefreshTokenRecord>,
}

impl CredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            auth_sessions: CredentialTable::new(CredentialKind::AuthSession, STATE_ID_BYTES),
            auth_codes: CredentialTable::new(CredentialKind::AuthCode, AUTH_CODE_BYTES),
            access_tokens: CredentialTable::new(CredentialKind::AccessToken, TOKEN_BYTES),
            refresh_tokens: CredentialTable::new(CredentialKind::RefreshToken, TOKEN_BYTES),
        }
    }

    /// Pending `/authorize` flows keyed by internal state id
    #[must_use]
    pub const fn auth_sessions(&self) -> &CredentialTable<AuthSession> {
        &self.auth_sessions
    }

    /// Authorization codes
    #[must_use]
    pub const fn auth_codes(&self) -> &CredentialTable<AuthCode> {
        &self.auth_codes
    }

    /// Access tokens
    #[must_use]
    pub const fn access_tokens(&self) -> &CredentialTable<AccessTokenRecord> {
        &self.access_tokens
    }

    /// Refresh tokens
    #[must_use]
    pub const fn refresh_tokens(&self) -> &CredentialTable<RefreshTokenRecord> {
        &self.refresh_tokens
    }

    /// Replace `old` with `replacement` and return the new refresh token
    ///
    /// The old token is removed first; if it is already gone (a concurrent
    /// rotation won) nothing is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `old` is no longer present
    pub fn rotate_refresh_token(
        &self,
        old: &str,
        replacement: RefreshTokenRecord,
    ) -> StoreResult<String> {
        self.refresh_tokens.take(old)?;
        self.refresh_tokens.insert(replacement)
    }

    /// Drop expired sessions, codes and access tokens
    ///
    /// Refresh tokens carry no expiry and are only removed by rotation.
    pub fn purge_expired(
        &self,
        now: DateTime<Utc>,
        session_ttl: Duration,
        code_ttl: Duration,
    ) -> PurgeStats {
        PurgeStats {
            auth_sessions: self
                .auth_sessions
                .retain_where(|session| !session.is_expired(now, session_ttl)),
            auth_codes: self
                .auth_codes
                .retain_where(|code| !code.is_expired(now, code_ttl)),
            access_tokens: self
                .access_tokens
                .retain_where(|token| !token.is_expired(now)),
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

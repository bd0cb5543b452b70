// ABOUTME: OAuth 2.0 client for the upstream identity provider (GitHub)
// ABOUTME: Provider trait the authorization proxy depends on and its reqwest implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OAuth 2.0 Client Module
//!
//! The server acts as an OAuth 2.0 client of GitHub on behalf of its users.
//! The proxy only sees the [`UpstreamOAuthClient`] trait, which keeps the
//! provider swappable in tests.

/// GitHub implementation of the upstream client
pub mod client;

pub use client::{
    GitHubClient, GitHubOrganization, GitHubUser, UpstreamError, UpstreamOAuthClient,
    UpstreamResult, UpstreamToken,
};

// ABOUTME: PKCE (RFC 7636) S256 verification for authorization code redemption
// ABOUTME: Pure function comparing a code verifier against the stored challenge in constant time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compute the S256 challenge for a verifier: `BASE64URL(SHA256(verifier))` without padding
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Verify a PKCE code verifier against the challenge recorded at `/authorize`
///
/// Both empty means the client did not use PKCE and passes. Exactly one
/// empty fails.
#[must_use]
pub fn verify_pkce(verifier: &str, challenge: &str) -> bool {
    match (verifier.is_empty(), challenge.is_empty()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => {
            let computed = s256_challenge(verifier);
            computed.as_bytes().ct_eq(challenge.as_bytes()).into()
        }
    }
}

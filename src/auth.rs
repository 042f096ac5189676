// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Password policy and credential hashing.
//!
//! Credentials are stored as `sha256i$<iterations>$<salt-hex>$<digest-hex>`:
//! a random per-account salt and an iterated SHA-256 chain.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{LedgerError, Result};

const SCHEME: &str = "sha256i";
const SALT_LEN: usize = 16;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// At least six characters with one letter and one digit. Nothing else is
/// required.
pub fn check_password_policy(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LedgerError::invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err(LedgerError::invalid("password must contain a letter"));
    }
    if !password.chars().any(char::is_numeric) {
        return Err(LedgerError::invalid("password must contain a digit"));
    }
    Ok(())
}

pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let digest = derive(password.as_bytes(), &salt, iterations.max(1));
    format!(
        "{}${}${}${}",
        SCHEME,
        iterations.max(1),
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// A well-formed credential no password matches. Verifying against it costs
/// the same as a real check, so unknown user names are not faster to reject.
pub fn dummy_hash(iterations: u32) -> String {
    format!(
        "{}${}${}${}",
        SCHEME,
        iterations.max(1),
        hex::encode([0u8; SALT_LEN]),
        hex::encode([0u8; 32])
    )
}

/// Malformed stored credentials never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iters), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iters.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let actual = derive(password.as_bytes(), &salt, iterations);
    bool::from(actual.as_slice().ct_eq(expected.as_slice()))
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password);
    let mut digest: [u8; 32] = hasher.finalize().into();
    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(salt);
        hasher.update(password);
        digest = hasher.finalize().into();
    }
    digest
}

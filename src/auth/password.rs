// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and verification using argon2id.
//!
//! Digests are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! cost parameters, so verification never needs anything but the digest.
//! Hashing is CPU-bound: request handlers go through [`hash_async`] and
//! [`verify_async`], which run on tokio's blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Minimum accepted password length for new or changed passwords.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a password using argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored digest.
///
/// A missing or unparseable digest is a mismatch, never an error.
pub fn verify_password(password: &str, digest: Option<&str>) -> bool {
    let Some(digest) = digest else {
        return false;
    };
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))?
}

/// [`verify_password`] on the blocking pool. A cancelled or panicked task
/// counts as a failed verification.
pub async fn verify_async(password: String, digest: Option<String>) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, digest.as_deref()))
        .await
        .unwrap_or(false)
}

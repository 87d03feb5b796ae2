// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password login.
//!
//! ## Protocol
//!
//! 1. Look up the account by e-mail
//! 2. Verify the submitted password against the stored digest
//! 3. Issue an access token carrying `{sub, email, role}`
//! 4. Return the token and the public profile
//!
//! An unknown e-mail and a wrong password produce the same
//! `AuthError::InvalidCredentials`, so the endpoint cannot be used to probe
//! which addresses have accounts.

use std::sync::Arc;

use tracing::{info, warn};

use super::claims::TokenSubject;
use super::password;
use super::token::TokenIssuer;
use super::AuthError;
use crate::models::{LoginResponse, UserProfile};
use crate::storage::{StorageResult, StoredUser};

/// Read access to credential records.
pub trait CredentialStore {
    /// Look up an account by e-mail (case-insensitive).
    fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>>;
}

/// Orchestrates lookup, password verification and token issuance.
#[derive(Debug, Clone)]
pub struct Authenticator {
    tokens: Arc<TokenIssuer>,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenIssuer>) -> Self {
        Self { tokens }
    }

    /// Log in with e-mail and password.
    pub async fn login(
        &self,
        store: &impl CredentialStore,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthError> {
        let record = store
            .find_by_email(email)
            .map_err(|e| AuthError::Internal(format!("credential lookup failed: {e}")))?;

        let Some(record) = record else {
            warn!("Failed login attempt: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        let valid = password::verify_async(password.to_string(), record.password_hash.clone()).await;
        if !valid {
            warn!(user_id = %record.id, "Failed login attempt: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&TokenSubject {
            user_id: record.id.clone(),
            email: record.email.clone(),
            role: record.role,
        })?;

        info!(user_id = %record.id, role = %record.role, "User logged in");

        Ok(LoginResponse {
            token: issued.token,
            expires_in: issued.expires_in,
            profile: UserProfile::from(record),
        })
    }
}

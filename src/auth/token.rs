// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token issuance and validation (HS256 JWT).
//!
//! Verification is purely cryptographic plus a clock comparison; it never
//! touches storage. The signing secret is handed over once at startup and
//! never leaves this module.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::claims::{TokenClaims, TokenSubject};

/// Default token lifetime (one hour).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest accepted token lifetime (30 days).
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("signing key is missing or empty")]
    MisconfiguredSigningKey,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
    pub claims: TokenClaims,
}

/// Issues and verifies signed access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer from the process-wide signing secret.
    pub fn new(secret: &[u8], ttl_secs: i64) -> Result<Self, TokenError> {
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Err(TokenError::MisconfiguredSigningKey);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for the given subject, valid from now.
    pub fn issue(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, now_secs())
    }

    /// Issue a token as if it had been signed at `issued_at`.
    pub fn issue_at(&self, subject: &TokenSubject, issued_at: i64) -> Result<IssuedToken, TokenError> {
        let exp = issued_at
            .checked_add(self.ttl_secs)
            .ok_or_else(|| TokenError::Encoding("token expiry overflows".to_string()))?;
        let claims = TokenClaims {
            sub: subject.user_id.clone(),
            email: subject.email.clone(),
            role: subject.role,
            iat: issued_at,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl_secs,
            claims,
        })
    }

    /// Validate a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;
        Ok(data.claims)
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Callers only ever see a generic access-denied body. Whether an e-mail
//! exists, or why a token was rejected, is logged but never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::token::TokenError;

/// Authentication error type.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown e-mail or wrong password (deliberately indistinguishable)
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Missing, malformed, forged or expired bearer token
    #[error("Authentication required")]
    Unauthenticated,
    /// Authenticated, but the role is too low for the operation
    #[error("Insufficient permissions for this operation")]
    InsufficientPermissions,
    /// Internal error (detail is logged, not returned)
    #[error("Internal authentication error")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed | TokenError::InvalidSignature | TokenError::Expired => {
                AuthError::Unauthenticated
            }
            // Startup rejects a missing key, so this only surfaces as an internal fault.
            TokenError::MisconfiguredSigningKey | TokenError::Encoding(_) => {
                AuthError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(%detail, "authentication internal error");
        }

        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_credentials_returns_401() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error_code"], "invalid_credentials");
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn unauthenticated_returns_401() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error_code"], "unauthenticated");
    }

    #[tokio::test]
    async fn insufficient_permissions_returns_403() {
        let response = AuthError::InsufficientPermissions.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn internal_detail_is_not_returned() {
        let response = AuthError::Internal("disk on fire".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body["error"].as_str().unwrap().contains("disk"));
    }

    #[test]
    fn signing_faults_are_internal() {
        let err = AuthError::from(TokenError::Encoding("overflow".to_string()));
        assert!(matches!(err, AuthError::Internal(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            AuthError::from(TokenError::MisconfiguredSigningKey),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn every_token_failure_is_unauthenticated() {
        for e in [TokenError::Malformed, TokenError::InvalidSignature, TokenError::Expired] {
            assert!(matches!(AuthError::from(e), AuthError::Unauthenticated));
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims embedded in every access token.
///
/// The shape is fixed; tokens carrying anything else fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Account e-mail at issuance time
    pub email: String,
    /// Role at issuance time
    pub role: Role,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiration (unix timestamp)
    pub exp: i64,
}

/// The identity facts a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Authenticated user information extracted from a verified token.
///
/// This is the primary type used throughout the application to represent
/// the authenticated user making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    /// User ID (`sub` claim)
    pub user_id: String,

    /// E-mail the token was issued for
    pub email: String,

    /// User's role
    pub role: Role,

    /// Token expiration (Unix timestamp, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Build from verified claims.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            expires_at: claims.exp,
        }
    }

    /// Check if the user has at least the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: "user_123".to_string(),
            email: "jane@example.com".to_string(),
            role: Role::Admin,
            iat: 1700000000,
            exp: 1700003600,
        }
    }

    #[test]
    fn from_claims_copies_identity() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.expires_at, 1700003600);
    }

    #[test]
    fn has_role_checks_privilege() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert!(user.has_role(Role::User));
        assert!(user.has_role(Role::Admin));
        assert!(!user.has_role(Role::SuperAdmin));
    }

    #[test]
    fn claims_use_fixed_field_names() {
        let value = serde_json::to_value(sample_claims()).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["email", "exp", "iat", "role", "sub"]);
        assert_eq!(value["role"], "admin");
    }

    #[test]
    fn expiry_is_not_serialized() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        let value = serde_json::to_value(user).unwrap();
        assert_eq!(value["userId"], "user_123");
        assert!(value.get("expiresAt").is_none());
    }
}

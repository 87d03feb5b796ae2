// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies used by the REST API. All types derive
//! `ToSchema` for the OpenAPI document and use camelCase on the wire.
//!
//! ## Model Categories
//!
//! - **Auth**: login request/response
//! - **Users**: public profile, create/update payloads, delete result
//!
//! No type in this module carries a password digest. Plaintext passwords only
//! appear in request bodies and are redacted from `Debug` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::StoredUser;

// =============================================================================
// Users
// =============================================================================

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredUser> for UserProfile {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<StoredUser> for UserProfile {
    fn from(user: StoredUser) -> Self {
        Self::from(&user)
    }
}

/// Payload for POST /v1/users
#[derive(Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Jane")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "password123", min_length = 6)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Payload for PATCH /v1/users/{id}. Absent fields are left unchanged.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "John Updated")]
    pub name: Option<String>,
    #[schema(example = "updated@example.com")]
    pub email: Option<String>,
    #[schema(example = "newpassword")]
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl std::fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

/// Response for POST /v1/users
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Response for DELETE /v1/users/{id}
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
    pub id_affected: String,
}

// =============================================================================
// Auth
// =============================================================================

/// Payload for POST /v1/auth/login
#[derive(Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Successful login: a bearer token plus the caller's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub profile: UserProfile,
}

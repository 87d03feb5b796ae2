// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Each account is stored as a separate JSON file under `users/`, keyed by a
//! UUID. E-mail uniqueness is enforced on create/update by scanning; callers
//! that write concurrently must serialize writes (see `UserService`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::{DocumentStore, StorageError, StorageResult};
use crate::auth::{CredentialStore, Role};

/// Account record as persisted.
///
/// Holds the password digest, so it never crosses the API boundary; handlers
/// convert it to a `UserProfile` first.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Normalized e-mail (login identity key)
    pub email: String,
    /// Argon2 PHC digest
    #[serde(default)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Lower-case and trim an e-mail so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for user operations on the document store.
pub struct UserRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    /// Only UUIDs are accepted as ids; anything else could escape the users
    /// directory once turned into a path.
    fn is_valid_id(user_id: &str) -> bool {
        Uuid::parse_str(user_id).is_ok()
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> bool {
        Self::is_valid_id(user_id) && self.storage.exists(self.storage.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(self.storage.paths().user(user_id))
    }

    /// Get a user by e-mail, if any.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let email = normalize_email(email);
        Ok(self.list()?.into_iter().find(|user| user.email == email))
    }

    /// List all users, oldest first.
    pub fn list(&self) -> StorageResult<Vec<StoredUser>> {
        let user_ids = self
            .storage
            .list_files(self.storage.paths().users_dir(), "json")?;

        let mut users = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            match self.get(&id) {
                Ok(user) => users.push(user),
                // Deleted between listing and reading.
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    /// Create a new user.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        if !Self::is_valid_id(&user.id) {
            return Err(StorageError::NotFound(format!("User {}", user.id)));
        }
        if self.exists(&user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        if self.find_by_email(&user.email)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "User with email {}",
                user.email
            )));
        }

        self.storage
            .write_json(self.storage.paths().user(&user.id), user)
    }

    /// Update an existing user.
    pub fn update(&self, user: &StoredUser) -> StorageResult<()> {
        if !self.exists(&user.id) {
            return Err(StorageError::NotFound(format!("User {}", user.id)));
        }
        if let Some(other) = self.find_by_email(&user.email)? {
            if other.id != user.id {
                return Err(StorageError::AlreadyExists(format!(
                    "User with email {}",
                    user.email
                )));
            }
        }

        self.storage
            .write_json(self.storage.paths().user(&user.id), user)
    }

    /// Delete a user.
    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }

        self.storage.delete(self.storage.paths().user(user_id))
    }
}

impl CredentialStore for UserRepository<'_> {
    fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        UserRepository::find_by_email(self, email)
    }
}

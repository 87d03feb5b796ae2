// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User account management.
//!
//! This is the only writer of credential records. Every new or changed
//! password is hashed here before it reaches storage, and writes are
//! serialized so the e-mail uniqueness check and the write happen atomically
//! with respect to other writers.
//!
//! ## Access rules
//!
//! - Anonymous registration always yields a `user`; higher roles are granted
//!   only by an admin holding at least that role.
//! - An account can be changed by its owner, or by an admin whose role is at
//!   least the target's. An admin cannot reset a super-admin's credentials.
//! - Only admins change roles, and never above their own.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{self, MIN_PASSWORD_LEN};
use crate::auth::{AuthenticatedUser, Role};
use crate::config::BootstrapAdmin;
use crate::error::ApiError;
use crate::models::{CreateUserRequest, DeleteUserResponse, UpdateUserRequest, UserProfile};
use crate::storage::{normalize_email, DocumentStore, StoredUser, UserRepository};

/// Basic shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name must not be empty"));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Email is not valid"));
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Nobody may grant a role above their own, and only admins grant anything
/// but `user`.
fn ensure_can_grant(actor: Option<&AuthenticatedUser>, role: Role) -> Result<(), ApiError> {
    if role == Role::User {
        return Ok(());
    }
    match actor {
        Some(actor) if actor.has_role(Role::Admin) && actor.has_role(role) => Ok(()),
        _ => Err(ApiError::forbidden(
            "Assigning this role requires an administrator of equal or higher rank",
        )),
    }
}

/// Accounts may be changed by their owner, or by an admin of at least the
/// target's rank.
fn ensure_can_manage(actor: &AuthenticatedUser, target: &StoredUser) -> Result<(), ApiError> {
    if actor.user_id == target.id {
        return Ok(());
    }
    if actor.has_role(Role::Admin) && actor.has_role(target.role) {
        return Ok(());
    }
    Err(ApiError::forbidden("Not allowed to modify this account"))
}

#[derive(Clone)]
pub struct UserService {
    storage: Arc<DocumentStore>,
    write_lock: Arc<Mutex<()>>,
}

impl UserService {
    pub fn new(storage: Arc<DocumentStore>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn repo(&self) -> UserRepository<'_> {
        UserRepository::new(&self.storage)
    }

    /// Register an account. Anonymous callers only get the `user` role.
    pub async fn create(
        &self,
        request: CreateUserRequest,
        actor: Option<&AuthenticatedUser>,
    ) -> Result<UserProfile, ApiError> {
        ensure_can_grant(actor, request.role)?;
        self.insert(&request.name, &request.email, request.password, request.role)
            .await
    }

    /// Create the configured super-admin unless the e-mail is already taken.
    /// Returns whether an account was created.
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<bool, ApiError> {
        if self.repo().find_by_email(&admin.email)?.is_some() {
            info!("Bootstrap admin already present");
            return Ok(false);
        }
        let profile = self
            .insert(&admin.name, &admin.email, admin.password.clone(), Role::SuperAdmin)
            .await?;
        info!(user_id = %profile.id, "Bootstrap admin created");
        Ok(true)
    }

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password: String,
        role: Role,
    ) -> Result<UserProfile, ApiError> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        validate_password(&password)?;

        let password_hash = password::hash_async(password).await?;

        let now = Utc::now();
        let user = StoredUser {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash: Some(password_hash),
            role,
            created_at: now,
            updated_at: now,
        };

        {
            let _guard = self.write_lock.lock().await;
            self.repo().create(&user)?;
        }

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(UserProfile::from(user))
    }

    pub fn list(&self) -> Result<Vec<UserProfile>, ApiError> {
        Ok(self.repo().list()?.into_iter().map(UserProfile::from).collect())
    }

    pub fn get(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        Ok(self.repo().get(user_id)?.into())
    }

    /// Apply a partial update on behalf of `actor`.
    pub async fn update(
        &self,
        user_id: &str,
        request: UpdateUserRequest,
        actor: &AuthenticatedUser,
    ) -> Result<UserProfile, ApiError> {
        if actor.user_id != user_id && !actor.has_role(Role::Admin) {
            return Err(ApiError::forbidden("Not allowed to modify this account"));
        }
        if let Some(role) = request.role {
            if !actor.has_role(Role::Admin) {
                return Err(ApiError::forbidden("Only administrators can change roles"));
            }
            ensure_can_grant(Some(actor), role)?;
        }

        let name = request.name.as_deref().map(validate_name).transpose()?;
        let email = request.email.as_deref().map(validate_email).transpose()?;
        let password_hash = match request.password {
            Some(password) => {
                validate_password(&password)?;
                Some(password::hash_async(password).await?)
            }
            None => None,
        };

        let _guard = self.write_lock.lock().await;
        let repo = self.repo();
        let mut user = repo.get(user_id)?;
        ensure_can_manage(actor, &user)?;

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(hash) = password_hash {
            user.password_hash = Some(hash);
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        repo.update(&user)?;

        info!(user_id = %user.id, actor = %actor.user_id, "User updated");
        Ok(UserProfile::from(user))
    }

    pub async fn delete(
        &self,
        user_id: &str,
        actor: &AuthenticatedUser,
    ) -> Result<DeleteUserResponse, ApiError> {
        {
            let _guard = self.write_lock.lock().await;
            let repo = self.repo();
            let user = repo.get(user_id)?;
            ensure_can_manage(actor, &user)?;
            repo.delete(user_id)?;
        }

        info!(user_id = %user_id, actor = %actor.user_id, "User deleted");
        Ok(DeleteUserResponse {
            success: true,
            message: "User deleted successfully".to_string(),
            id_affected: user_id.to_string(),
        })
    }
}

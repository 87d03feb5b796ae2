// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AdminOnly, Auth, AuthenticatedUser, Role};
use crate::error::ApiError;
use crate::models::{
    CreateUserRequest, CreateUserResponse, DeleteUserResponse, UpdateUserRequest, UserProfile,
};
use crate::state::AppState;

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserMeResponse {
    /// User's unique ID (`sub` claim)
    pub user_id: String,
    /// E-mail the token was issued for
    pub email: String,
    /// User's role at token issuance
    pub role: Role,
}

impl From<AuthenticatedUser> for UserMeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Register a new account.
///
/// Open to anonymous callers for the `user` role. Any other role needs a
/// bearer token of an admin holding at least that role.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    tag = "Users",
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Authorization header present but invalid"),
        (status = 403, description = "Caller may not assign the requested role"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    caller: Option<Auth>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let actor = caller.map(|Auth(user)| user);
    let user = state.users.create(request, actor.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [UserProfile]),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(state.users.list()?))
}

/// Get the current authenticated user's information.
///
/// Reflects the token, not storage: a role changed after login shows up
/// only in the next token.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}

#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "Identifier of the user")
    ),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserProfile),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.users.get(&user_id)?))
}

#[utoipa::path(
    patch,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "Identifier of the user to update")
    ),
    request_body = UpdateUserRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserProfile),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Not the account owner, or role change not permitted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn update_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Auth(actor): Auth,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.users.update(&user_id, request, &actor).await?))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "Identifier of the user to delete")
    ),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = DeleteUserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Administrator of at least the target's role required"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    tracing::debug!(admin = %admin.user_id, target_user = %user_id, "delete requested");
    Ok(Json(state.users.delete(&user_id, &admin).await?))
}

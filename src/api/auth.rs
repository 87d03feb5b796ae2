// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login endpoint.

use axum::{extract::State, Json};

use crate::auth::AuthError;
use crate::models::{LoginRequest, LoginResponse};
use crate::state::AppState;
use crate::storage::UserRepository;

/// Exchange e-mail and password for a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let repo = UserRepository::new(&state.storage);
    let response = state
        .authenticator
        .login(&repo, &request.email, &request.password)
        .await?;
    Ok(Json(response))
}

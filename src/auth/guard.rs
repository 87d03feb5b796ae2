// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access guard for protected routes.
//!
//! [`authenticate_request`] is the transport-independent gate: it takes the
//! raw `Authorization` header value and returns the principal or
//! `AuthError::Unauthenticated`. [`require_auth`] wraps it as axum middleware
//! and is layered in front of every protected route:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/users", get(list_users))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::token::TokenIssuer;
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Pull the token out of a `Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the principal for a request from its raw `Authorization` header.
pub fn authenticate_request(
    tokens: &TokenIssuer,
    raw_header: Option<&str>,
) -> Result<AuthenticatedUser, AuthError> {
    let Some(header) = raw_header else {
        debug!("rejecting request: no authorization header");
        return Err(AuthError::Unauthenticated);
    };

    let Some(token) = bearer_token(header) else {
        debug!("rejecting request: authorization header is not a bearer token");
        return Err(AuthError::Unauthenticated);
    };

    let claims = tokens.verify(token).map_err(|e| {
        debug!(reason = %e, "rejecting request: token verification failed");
        AuthError::Unauthenticated
    })?;

    Ok(AuthenticatedUser::from_claims(claims))
}

/// Authentication middleware: verifies the bearer token and stores the
/// principal in request extensions for the `Auth` extractor.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    // A header with non-visible ASCII is treated as absent.
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match authenticate_request(&state.tokens, header) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TokenSubject};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"guard-test-secret", 3600).unwrap()
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: "user-1".to_string(),
            email: "jane@example.com".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn valid_bearer_token_passes() {
        let tokens = issuer();
        let token = tokens.issue(&subject()).unwrap().token;

        let user = authenticate_request(&tokens, Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let tokens = issuer();
        let token = tokens.issue(&subject()).unwrap().token;
        assert!(authenticate_request(&tokens, Some(&format!("bearer  {token} "))).is_ok());
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let result = authenticate_request(&issuer(), None);
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn non_bearer_header_is_unauthenticated() {
        let tokens = issuer();
        for header in ["", "Bearer", "Bearer   ", "Basic amFuZTpwdw==", "Token abc"] {
            let result = authenticate_request(&tokens, Some(header));
            assert!(matches!(result, Err(AuthError::Unauthenticated)), "{header:?}");
        }
    }

    #[test]
    fn malformed_token_is_unauthenticated() {
        let result = authenticate_request(&issuer(), Some("Bearer not.a.jwt"));
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let tokens = issuer();
        let expired = tokens
            .issue_at(&subject(), chrono::Utc::now().timestamp() - 7200)
            .unwrap()
            .token;
        let result = authenticate_request(&tokens, Some(&format!("Bearer {expired}")));
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn token_from_other_issuer_is_unauthenticated() {
        let other = TokenIssuer::new(b"someone-else", 3600).unwrap();
        let token = other.issue(&subject()).unwrap().token;
        let result = authenticate_request(&issuer(), Some(&format!("Bearer {token}")));
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_auth, AuthenticatedUser, Role},
    models::{
        CreateUserRequest, CreateUserResponse, DeleteUserResponse, LoginRequest, LoginResponse,
        UpdateUserRequest, UserProfile,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod users;

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let guard = middleware::from_fn_with_state(state.clone(), require_auth);

    let protected = Router::new()
        .route("/users/me", get(users::get_current_user))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(guard.clone());

    let v1_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route(
            "/users",
            post(users::create_user).merge(get(users::list_users).route_layer(guard)),
        )
        .merge(protected)
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(allowed_origins))
}

/// CORS policy for browser clients on the configured origins.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        users::create_user,
        users::list_users,
        users::get_current_user,
        users::get_user,
        users::update_user,
        users::delete_user,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            UserProfile,
            CreateUserRequest,
            CreateUserResponse,
            UpdateUserRequest,
            DeleteUserResponse,
            AuthenticatedUser,
            Role,
            users::UserMeResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Password login"),
        (name = "Users", description = "User account management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapAdmin;
    use crate::state::test_support::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        router(state, &["http://localhost:3000".to_string()])
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.expect("router is infallible")
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, auth_header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_as(app: &Router, token: Option<&str>, email: &str, role: &str) -> Response {
        send(
            app,
            json_request(
                "POST",
                "/v1/users",
                token,
                json!({"name": "Jane", "email": email, "password": "password123", "role": role}),
            ),
        )
        .await
    }

    async fn register(app: &Router, email: &str, role: &str) -> Value {
        let response = register_as(app, None, email, role).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    /// Seeds `root@example.com` as super-admin, the way startup does.
    async fn seed_root(state: &AppState) {
        let admin = BootstrapAdmin {
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(state.users.ensure_bootstrap_admin(&admin).await.unwrap());
    }

    async fn register_admin(app: &Router, email: &str) -> Value {
        let root_token = token_for(app, "root@example.com").await;
        let response = register_as(app, Some(&root_token), email, "admin").await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    async fn login(app: &Router, email: &str, password: &str) -> Response {
        send(
            app,
            json_request("POST", "/v1/auth/login", None, json!({"email": email, "password": password})),
        )
        .await
    }

    async fn token_for(app: &Router, email: &str) -> String {
        let response = login(app, email, "password123").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let _ = app(state).into_make_service();
    }

    #[tokio::test]
    async fn login_returns_token_and_profile_without_password() {
        let (state, _dir) = test_state();
        let app = app(state);
        register(&app, "jane@example.com", "user").await;

        let response = login(&app, "jane@example.com", "password123").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(!body["token"].as_str().unwrap().is_empty());

        let profile = body["profile"].as_object().unwrap();
        assert_eq!(profile["email"], "jane@example.com");
        assert_eq!(profile["role"], "user");
        assert_eq!(profile["name"], "Jane");
        for key in ["id", "createdAt", "updatedAt"] {
            assert!(profile.contains_key(key), "missing {key}");
        }
        assert!(!profile.contains_key("password"));
        assert!(!profile.contains_key("passwordHash"));
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let (state, _dir) = test_state();
        let app = app(state);
        register(&app, "jane@example.com", "user").await;

        let wrong = login(&app, "jane@example.com", "password124").await;
        let unknown = login(&app, "nobody@example.com", "password123").await;

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong).await, body_json(unknown).await);
    }

    #[tokio::test]
    async fn protected_routes_require_valid_token() {
        let (state, _dir) = test_state();
        let expired = state
            .tokens
            .issue_at(
                &crate::auth::TokenSubject {
                    user_id: "user-1".to_string(),
                    email: "jane@example.com".to_string(),
                    role: Role::User,
                },
                chrono::Utc::now().timestamp() - 7200,
            )
            .unwrap()
            .token;
        let app = app(state);
        let expired_header = format!("Bearer {expired}");

        for header in [None, Some("Bearer not-a-token"), Some(expired_header.as_str())] {
            let response = send(&app, get_request("/v1/users", header)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(response).await["error_code"], "unauthenticated");
        }
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_principal() {
        let (state, _dir) = test_state();
        seed_root(&state).await;
        let app = app(state);
        let created = register_admin(&app, "jane@example.com").await;
        let token = token_for(&app, "jane@example.com").await;

        let response = send(&app, get_request("/v1/users/me", Some(&format!("Bearer {token}")))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let me = body_json(response).await;
        assert_eq!(me["userId"], created["user"]["id"]);
        assert_eq!(me["email"], "jane@example.com");
        assert_eq!(me["role"], "admin");

        let response = send(&app, get_request("/v1/users", Some(&format!("Bearer {token}")))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let users = body_json(response).await;
        assert_eq!(users.as_array().unwrap().len(), 2);
        assert!(users[0].get("password").is_none());
    }

    #[tokio::test]
    async fn password_change_takes_effect_on_next_login() {
        let (state, _dir) = test_state();
        let app = app(state);
        let created = register(&app, "jane@example.com", "user").await;
        let token = token_for(&app, "jane@example.com").await;
        let id = created["user"]["id"].as_str().unwrap();

        let response = send(
            &app,
            json_request(
                "PATCH",
                &format!("/v1/users/{id}"),
                Some(&token),
                json!({"password": "brand-new-pass"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(login(&app, "jane@example.com", "password123").await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(login(&app, "jane@example.com", "brand-new-pass").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn users_cannot_change_another_users_password() {
        let (state, _dir) = test_state();
        let app = app(state);
        let victim = register(&app, "jane@example.com", "user").await;
        register(&app, "eve@example.com", "user").await;
        let eve_token = token_for(&app, "eve@example.com").await;
        let id = victim["user"]["id"].as_str().unwrap();

        let response = send(
            &app,
            json_request(
                "PATCH",
                &format!("/v1/users/{id}"),
                Some(&eve_token),
                json!({"password": "taken-over", "email": "eve2@example.com"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        assert_eq!(login(&app, "jane@example.com", "password123").await.status(), StatusCode::OK);
        assert_eq!(login(&app, "jane@example.com", "taken-over").await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admins_cannot_reset_a_super_admin() {
        let (state, _dir) = test_state();
        seed_root(&state).await;
        let app = app(state);
        register_admin(&app, "boss@example.com").await;
        let admin_token = token_for(&app, "boss@example.com").await;

        let root_token = token_for(&app, "root@example.com").await;
        let response = send(&app, get_request("/v1/users/me", Some(&format!("Bearer {root_token}")))).await;
        let root_id = body_json(response).await["userId"].as_str().unwrap().to_string();

        let response = send(
            &app,
            json_request(
                "PATCH",
                &format!("/v1/users/{root_id}"),
                Some(&admin_token),
                json!({"password": "taken-over"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(login(&app, "root@example.com", "password123").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn anonymous_registration_only_creates_users() {
        let (state, _dir) = test_state();
        let app = app(state);

        for role in ["super-admin", "admin"] {
            let response = register_as(&app, None, "eve@example.com", role).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
        assert_eq!(login(&app, "eve@example.com", "password123").await.status(), StatusCode::UNAUTHORIZED);

        let response = register_as(&app, Some("not-a-token"), "eve@example.com", "user").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        register(&app, "jane@example.com", "user").await;
        let user_token = token_for(&app, "jane@example.com").await;
        let response = register_as(&app, Some(&user_token), "eve@example.com", "admin").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let created = register(&app, "eve@example.com", "user").await;
        assert_eq!(created["user"]["role"], "user");
    }

    #[tokio::test]
    async fn delete_requires_admin() {
        let (state, _dir) = test_state();
        seed_root(&state).await;
        let app = app(state);
        let target = register(&app, "jane@example.com", "user").await;
        register_admin(&app, "boss@example.com").await;
        let id = target["user"]["id"].as_str().unwrap();

        let user_token = token_for(&app, "jane@example.com").await;
        let response = send(
            &app,
            json_request("DELETE", &format!("/v1/users/{id}"), Some(&user_token), json!({})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin_token = token_for(&app, "boss@example.com").await;
        let response = send(
            &app,
            json_request("DELETE", &format!("/v1/users/{id}"), Some(&admin_token), json!({})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["idAffected"], id);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (state, _dir) = test_state();
        let app = app(state);
        register(&app, "jane@example.com", "user").await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/v1/users",
                None,
                json!({"name": "Jane", "email": "jane@example.com", "password": "password123"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn health_and_docs_are_public() {
        let (state, _dir) = test_state();
        let app = app(state);

        let response = send(&app, get_request("/health/live", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, get_request("/api-doc/openapi.json", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"].get("/v1/auth/login").is_some());
        assert!(doc["components"]["securitySchemes"].get("bearer").is_some());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (state, _dir) = test_state();
        let response = send(&app(state), get_request("/health/live", None)).await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}

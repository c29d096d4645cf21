use axum::{
    extract::State, http::StatusCode, middleware::from_fn_with_state, response::IntoResponse,
    routing::get, Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::jwt::JwtVerifier;
use crate::auth::middleware::{auth_middleware, AuthUser};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    message: String,
}

/// Public health check endpoint
///
/// Returns status "ok" if the service is running
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            message: "Server is running".to_string(),
        }),
    )
}

/// Protected health check endpoint
///
/// Returns status "ok" along with the caller's identity, plus the database
/// status for services that own one
#[utoipa::path(
    get,
    path = "/api/health/protected",
    responses(
        (status = 200, description = "Server is healthy and user is authenticated", body = HealthResponse),
        (status = 401, description = "Unauthorized - Invalid or missing token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "health"
)]
pub async fn protected_health_check(
    State(pool): State<Option<PgPool>>,
    user: AuthUser,
) -> impl IntoResponse {
    let db_status = match pool {
        Some(pool) => match sqlx::query("SELECT 1").fetch_one(&pool).await {
            Ok(_) => "ok",
            Err(_) => "error",
        },
        None => "n/a",
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            message: format!(
                "Server is running. Authenticated as user: {} with roles: {:?}. Database status: {}",
                user.user_id, user.roles, db_status
            ),
        }),
    )
}

pub fn routes(pool: Option<PgPool>, verifier: Arc<JwtVerifier>) -> Router {
    Router::new().route("/api/health", get(health_check)).route(
        "/api/health/protected",
        get(protected_health_check)
            .route_layer(from_fn_with_state(verifier, auth_middleware))
            .with_state(pool),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_token, Role};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"health_secret";

    fn app() -> Router {
        routes(None, Arc::new(JwtVerifier::hs256(SECRET)))
    }

    #[tokio::test]
    async fn test_public_health_check() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_health_check() {
        let unauthenticated = app()
            .oneshot(
                Request::builder()
                    .uri("/api/health/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

        let token = generate_token(SECRET, "u1", &[Role::User]).unwrap();
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/health/protected")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.contains("u1"));
        assert!(message.contains("Database status: n/a"));
    }
}

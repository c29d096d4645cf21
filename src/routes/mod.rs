pub mod admin;
pub mod categories;
pub mod health;

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::{TodoApiDoc, UsersApiDoc};
use crate::auth::jwt::JwtVerifier;
use crate::category::service::CategoryService;
use crate::users::controller::KeycloakState;

/// Router of the todo service
pub fn todo_app(
    pool: PgPool,
    category_service: Arc<CategoryService>,
    verifier: Arc<JwtVerifier>,
) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", TodoApiDoc::openapi()))
        .merge(health::routes(Some(pool), verifier.clone()))
        .merge(categories::routes(category_service, verifier))
        .route("/", get(|| async { "Planner todo service" }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Router of the user administration service
pub fn users_app(keycloak: KeycloakState, verifier: Arc<JwtVerifier>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", UsersApiDoc::openapi()))
        .merge(health::routes(None, verifier.clone()))
        .merge(admin::routes(keycloak, verifier))
        .route("/", get(|| async { "Planner users service" }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

use crate::auth::jwt::JwtVerifier;
use crate::auth::middleware::{auth_middleware, require_admin};
use crate::users::controller::{self, KeycloakState};
use axum::{
    middleware,
    routing::{post, put},
    Router,
};
use std::sync::Arc;

/// User administration routes, admin role required
pub fn routes(keycloak: KeycloakState, verifier: Arc<JwtVerifier>) -> Router {
    Router::new()
        .route("/admin/user/add", post(controller::add))
        .route("/admin/user/update", put(controller::update))
        .route("/admin/user/deletebyid", post(controller::delete_by_id))
        .route("/admin/user/id", post(controller::find_by_id))
        .route("/admin/user/search", post(controller::search))
        // layers run bottom-up: authenticate, then check the role
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(verifier, auth_middleware))
        .with_state(keycloak)
}

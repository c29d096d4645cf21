use crate::auth::jwt::JwtVerifier;
use crate::auth::middleware::auth_middleware;
use crate::category::controller;
use crate::category::service::CategoryService;
use axum::{
    middleware,
    routing::{delete, post, put},
    Router,
};
use std::sync::Arc;

/// Category routes, every one behind a bearer token
pub fn routes(category_service: Arc<CategoryService>, verifier: Arc<JwtVerifier>) -> Router {
    Router::new()
        .route("/category/all", post(controller::find_all))
        .route("/category/add", post(controller::add))
        .route("/category/update", put(controller::update))
        .route("/category/delete/:id", delete(controller::delete))
        .route("/category/search", post(controller::search))
        .route("/category/id", post(controller::find_by_id))
        .route_layer(middleware::from_fn_with_state(verifier, auth_middleware))
        .with_state(category_service)
}

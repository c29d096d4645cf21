use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};

use crate::auth::middleware::AuthUser;
use crate::keycloak::client::{created_id, KeycloakAdmin, KeycloakError};
use crate::users::model::UserDto;
use crate::validation::is_present;

/// Realm roles every new user gets; they must exist in the realm
pub const DEFAULT_ROLES: [&str; 2] = ["user", "admin"];

pub type KeycloakState = Arc<dyn KeycloakAdmin>;

fn not_acceptable(message: impl Into<String>) -> Response {
    (StatusCode::NOT_ACCEPTABLE, message.into()).into_response()
}

fn keycloak_error_to_response(err: KeycloakError) -> Response {
    match err {
        KeycloakError::Status { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, body).into_response()
        }
        KeycloakError::Transport(e) if e.is_connect() || e.is_timeout() => {
            error!("Identity provider unreachable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "identity provider unavailable",
            )
                .into_response()
        }
        KeycloakError::MissingUserId => not_acceptable("missed param: id"),
        KeycloakError::InvalidUserId(_) => not_acceptable("invalid param: id"),
        e => {
            error!("Identity provider call failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Raw text bodies; a JSON string literal is unwrapped
fn text_body(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.trim().to_string())
}

/// Create a user in the identity provider with the default roles
#[utoipa::path(
    post,
    path = "/admin/user/add",
    tag = "users",
    request_body = UserDto,
    responses(
        (status = 201, description = "User created"),
        (status = 406, description = "Missing email, password or username", body = String),
        (status = 409, description = "User or email already exists", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add(
    State(keycloak): State<KeycloakState>,
    admin: AuthUser,
    Json(user): Json<UserDto>,
) -> Response {
    if !is_present(user.email.as_deref()) {
        return not_acceptable("missed param: email");
    }

    if !is_present(user.password.as_deref()) {
        return not_acceptable("missed param: password");
    }

    if !is_present(user.username.as_deref()) {
        return not_acceptable("missed param: username");
    }

    let created = match keycloak.create_user(&user).await {
        Ok(created) => created,
        Err(e) => return keycloak_error_to_response(e),
    };

    if created.status == StatusCode::CONFLICT.as_u16() {
        return (
            StatusCode::CONFLICT,
            format!(
                "user or email already exists {}",
                user.email.unwrap_or_default()
            ),
        )
            .into_response();
    }

    let user_id = match created_id(&created) {
        Ok(id) => id,
        Err(e) => return keycloak_error_to_response(e),
    };
    info!("User {} created with userId: {} by {}", user, user_id, admin.user_id);

    let roles: Vec<String> = DEFAULT_ROLES.iter().map(|r| r.to_string()).collect();
    if let Err(e) = keycloak.add_roles(&user_id, &roles).await {
        return keycloak_error_to_response(e);
    }

    StatusCode::from_u16(created.status)
        .unwrap_or(StatusCode::CREATED)
        .into_response()
}

/// Update username, email and password of a user
#[utoipa::path(
    put,
    path = "/admin/user/update",
    tag = "users",
    request_body = UserDto,
    responses(
        (status = 200, description = "User updated"),
        (status = 406, description = "Missing id", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update(
    State(keycloak): State<KeycloakState>,
    _admin: AuthUser,
    Json(user): Json<UserDto>,
) -> Response {
    if !is_present(user.id.as_deref()) {
        return not_acceptable("missed param: id");
    }

    match keycloak.update_user(&user).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => keycloak_error_to_response(e),
    }
}

/// Delete a user by id (raw text body)
#[utoipa::path(
    post,
    path = "/admin/user/deletebyid",
    tag = "users",
    request_body(content = String, description = "User id", content_type = "text/plain"),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_by_id(
    State(keycloak): State<KeycloakState>,
    _admin: AuthUser,
    body: String,
) -> Response {
    let user_id = text_body(&body);

    match keycloak.delete_user(&user_id).await {
        Ok(()) => {
            info!("Deleted user {}", user_id);
            StatusCode::OK.into_response()
        }
        Err(e) => keycloak_error_to_response(e),
    }
}

/// Find a user by id (raw text body)
#[utoipa::path(
    post,
    path = "/admin/user/id",
    tag = "users",
    request_body(content = String, description = "User id", content_type = "text/plain"),
    responses(
        (status = 200, description = "The user", body = crate::keycloak::model::UserRepresentation),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn find_by_id(
    State(keycloak): State<KeycloakState>,
    _admin: AuthUser,
    body: String,
) -> Response {
    match keycloak.find_user_by_id(&text_body(&body)).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => keycloak_error_to_response(e),
    }
}

/// Exact email search (raw text body)
#[utoipa::path(
    post,
    path = "/admin/user/search",
    tag = "users",
    request_body(content = String, description = "Email", content_type = "text/plain"),
    responses(
        (status = 200, description = "Users with this email", body = [crate::keycloak::model::UserRepresentation]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search(
    State(keycloak): State<KeycloakState>,
    _admin: AuthUser,
    body: String,
) -> Response {
    let query = format!("email:{}", text_body(&body));

    match keycloak.search_users(&query).await {
        Ok(users) => Json(users).into_response(),
        Err(e) => keycloak_error_to_response(e),
    }
}

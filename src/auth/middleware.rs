use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    RequestPartsExt, TypedHeader,
};
use serde::Serialize;
use tracing::{error, info};

use super::jwt::{JwtVerifier, Role};

/// Authenticated principal taken from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: Option<String>,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: String,
}

fn auth_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(AuthErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Authentication middleware to protect routes
pub async fn auth_middleware<B>(
    State(verifier): State<Arc<JwtVerifier>>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, Response> {
    let (mut parts, body) = req.into_parts();

    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|e| {
            error!("Authorization header extraction failed: {:?}", e);
            auth_error(
                StatusCode::UNAUTHORIZED,
                "Missing or invalid Authorization header. Please provide a Bearer token",
            )
        })?;

    let claims = verifier.validate_token(bearer.token()).map_err(|e| {
        error!("Token validation failed: {:?}", e);
        auth_error(StatusCode::UNAUTHORIZED, "Invalid token. Please login again")
    })?;

    let auth_user = AuthUser {
        roles: claims.roles(),
        username: claims.preferred_username,
        user_id: claims.sub,
    };
    info!(
        "User authenticated: {} with roles {:?}",
        auth_user.user_id, auth_user.roles
    );

    parts.extensions.insert(auth_user);

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Role-based authorization, runs after `auth_middleware`
pub async fn require_role<B>(
    role: Role,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, Response> {
    let auth_user = match req.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => {
            error!("AuthUser not found in request extensions");
            return Err(auth_error(
                StatusCode::UNAUTHORIZED,
                "Authentication required",
            ));
        }
    };

    if !auth_user.has_role(&role) {
        error!(
            "Insufficient permissions for user: {} with roles {:?}, required role: {:?}",
            auth_user.user_id, auth_user.roles, role
        );
        return Err(auth_error(
            StatusCode::FORBIDDEN,
            &format!("Insufficient permissions. Required role: {}", role.as_str()),
        ));
    }

    Ok(next.run(req).await)
}

pub async fn require_admin<B>(req: Request<B>, next: Next<B>) -> Result<Response, Response> {
    require_role(Role::Admin, req, next).await
}

/// Extractor for authenticated user
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| auth_error(StatusCode::UNAUTHORIZED, "Authentication required"))
    }
}

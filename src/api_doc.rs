use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// API documentation of the todo service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Planner Todo API",
        version = "0.1.0",
        description = "Categories of the authenticated user"
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::protected_health_check,
        crate::category::controller::find_all,
        crate::category::controller::add,
        crate::category::controller::update,
        crate::category::controller::delete,
        crate::category::controller::search,
        crate::category::controller::find_by_id
    ),
    components(
        schemas(
            crate::routes::health::HealthResponse,
            crate::category::model::Category,
            crate::category::model::CategorySearchValues
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "categories", description = "Category management endpoints")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct TodoApiDoc;

/// API documentation of the user administration service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Planner Users API",
        version = "0.1.0",
        description = "User administration backed by the Keycloak realm"
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::protected_health_check,
        crate::users::controller::add,
        crate::users::controller::update,
        crate::users::controller::delete_by_id,
        crate::users::controller::find_by_id,
        crate::users::controller::search
    ),
    components(
        schemas(
            crate::routes::health::HealthResponse,
            crate::users::model::UserDto,
            crate::keycloak::model::UserRepresentation,
            crate::keycloak::model::CredentialRepresentation
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User administration endpoints")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct UsersApiDoc;

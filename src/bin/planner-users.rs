use std::sync::Arc;

use tracing::info;

use planner::auth::jwt::JwtVerifier;
use planner::config::{JwtConfig, KeycloakConfig, ServerConfig, DEFAULT_USERS_PORT};
use planner::keycloak::client::KeycloakClient;
use planner::{routes, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let server_config = ServerConfig::from_env(DEFAULT_USERS_PORT)?;
    let verifier = Arc::new(JwtVerifier::from_config(&JwtConfig::from_env()?)?);
    let keycloak_config = KeycloakConfig::from_env()?;

    info!(
        "Using Keycloak realm {} at {}",
        keycloak_config.realm, keycloak_config.server_url
    );
    let keycloak = Arc::new(KeycloakClient::new(&keycloak_config)?);

    let app = routes::users_app(keycloak, verifier);

    server::serve(app, &server_config, "Planner users service").await
}

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use planner::auth::jwt::JwtVerifier;
use planner::category::repository::PgCategoryRepository;
use planner::category::service::CategoryService;
use planner::config::{DatabaseConfig, JwtConfig, ServerConfig, DEFAULT_TODO_PORT};
use planner::{db, routes, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let server_config = ServerConfig::from_env(DEFAULT_TODO_PORT)?;
    let database_config = DatabaseConfig::from_env()?;
    let verifier = Arc::new(JwtVerifier::from_config(&JwtConfig::from_env()?)?);

    let pool = PgPoolOptions::new()
        .max_connections(database_config.max_connections)
        .connect(&database_config.url)
        .await?;

    if !db::check_db_initialized(&pool).await {
        db::init_db(&pool).await?;
    } else {
        info!("Database schema already present");
    }

    let repository = Arc::new(PgCategoryRepository::new(pool.clone()));
    let category_service = Arc::new(CategoryService::new(repository));

    let app = routes::todo_app(pool, category_service, verifier);

    server::serve(app, &server_config, "Planner todo service").await
}

//! GameBank Backend Service
//!
//! Entry point for the GameBank shared-game money tracker backend.
//! Connects to PostgreSQL, applies migrations and verifies that the
//! storage layer is ready for the transport layer wrapping this crate.

use gamebank_backend::config::AppConfig;
use gamebank_backend::database::{create_pool, run_migrations};
use gamebank_backend::error::{AppError, AppResult};
use gamebank_backend::AppState;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("gamebank_backend={},sqlx=warn", config.log_level).into()
            }),
        )
        .init();

    info!("GameBank backend starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);

    info!("Connecting to database...");
    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;
    info!("Database migrations completed successfully");

    // Initialize application state with repositories
    let _app_state = Arc::new(AppState::new(pool));
    info!("Application state initialized with repositories");

    info!("GameBank backend storage layer ready");
    Ok(())
}

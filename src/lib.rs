//! GameBank Backend Library
//!
//! This module exposes the backend components for use by tests and other consumers.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use repositories::*;
use std::sync::Arc;

/// Application state containing all repositories
pub struct AppState {
    pub database: Database,
    pub user_repo: Arc<UserRepository>,
    pub game_repo: Arc<GameRepository>,
    pub game_player_repo: Arc<GamePlayerRepository>,
    pub balance_repo: Arc<BalanceRepository>,
    pub claim_repo: Arc<ClaimRepository>,
}

impl AppState {
    /// Create a new AppState with initialized repositories
    pub fn new(pool: sqlx::PgPool) -> Self {
        let database = Database::new(pool.clone());

        Self {
            database: database.clone(),
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            game_repo: Arc::new(GameRepository::new(pool.clone())),
            game_player_repo: Arc::new(GamePlayerRepository::new(pool.clone())),
            balance_repo: Arc::new(BalanceRepository::new(pool.clone())),
            claim_repo: Arc::new(ClaimRepository::new(pool)),
        }
    }
}

use crate::error::RepositoryError;
use crate::models::{Game, GameStatus};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for game data access
pub struct GameRepository {
    pool: PgPool,
}

impl GameRepository {
    /// Create a new GameRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new game and seed the creator's membership.
    ///
    /// The creator auto-joins with the game's initial balance; this join-seed
    /// is the one place money enters the system.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        created_by: Uuid,
        name: &str,
        pin: &str,
        description: Option<&str>,
        initial_balance: Decimal,
        max_players: i32,
        max_transfer: Decimal,
        seasonal_collection: Decimal,
        has_common_fund: bool,
    ) -> Result<Game, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let game = sqlx::query_as::<_, Game>(
            r#"
            INSERT INTO games
            (created_by, name, pin, description, initial_balance, max_players, max_transfer, seasonal_collection, has_common_fund)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_by, name, pin, description, status, initial_balance,
                      max_players, max_transfer, seasonal_collection, has_common_fund,
                      created_at, updated_at
            "#,
        )
        .bind(created_by)
        .bind(name)
        .bind(pin)
        .bind(description)
        .bind(initial_balance)
        .bind(max_players)
        .bind(max_transfer)
        .bind(seasonal_collection)
        .bind(has_common_fund)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO game_players (game_id, user_id, current_balance)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(game.id)
        .bind(created_by)
        .bind(initial_balance)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(game)
    }

    /// Find a game by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Game>, RepositoryError> {
        let game = sqlx::query_as::<_, Game>(
            r#"
            SELECT id, created_by, name, pin, description, status, initial_balance,
                   max_players, max_transfer, seasonal_collection, has_common_fund,
                   created_at, updated_at
            FROM games
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(game)
    }

    /// Find a game by its join PIN
    pub async fn find_by_pin(&self, pin: &str) -> Result<Option<Game>, RepositoryError> {
        let game = sqlx::query_as::<_, Game>(
            r#"
            SELECT id, created_by, name, pin, description, status, initial_balance,
                   max_players, max_transfer, seasonal_collection, has_common_fund,
                   created_at, updated_at
            FROM games
            WHERE pin = $1
            "#,
        )
        .bind(pin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(game)
    }

    /// Find all games still accepting activity (pending or active)
    pub async fn find_open(&self) -> Result<Vec<Game>, RepositoryError> {
        let games = sqlx::query_as::<_, Game>(
            r#"
            SELECT id, created_by, name, pin, description, status, initial_balance,
                   max_players, max_transfer, seasonal_collection, has_common_fund,
                   created_at, updated_at
            FROM games
            WHERE status IN ('pending', 'active')
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(games)
    }

    /// Find all games a user created or participates in
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Game>, RepositoryError> {
        let games = sqlx::query_as::<_, Game>(
            r#"
            SELECT DISTINCT g.id, g.created_by, g.name, g.pin, g.description, g.status,
                   g.initial_balance, g.max_players, g.max_transfer, g.seasonal_collection,
                   g.has_common_fund, g.created_at, g.updated_at
            FROM games g
            LEFT JOIN game_players p ON p.game_id = g.id
            WHERE g.created_by = $1 OR p.user_id = $1
            ORDER BY g.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(games)
    }

    /// Update a game's status
    pub async fn update_status(
        &self,
        id: Uuid,
        status: GameStatus,
    ) -> Result<Game, RepositoryError> {
        let game = sqlx::query_as::<_, Game>(
            r#"
            UPDATE games
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, created_by, name, pin, description, status, initial_balance,
                      max_players, max_transfer, seasonal_collection, has_common_fund,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Game not found".to_string()))?;

        Ok(game)
    }

    /// Mark a game finished and remove its memberships and claims.
    ///
    /// The game row survives with status 'finished'; ledger entries are kept
    /// as the historical record.
    pub async fn finish(&self, id: Uuid) -> Result<Game, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let game = sqlx::query_as::<_, Game>(
            r#"
            UPDATE games
            SET status = 'finished', updated_at = NOW()
            WHERE id = $1
            RETURNING id, created_by, name, pin, description, status, initial_balance,
                      max_players, max_transfer, seasonal_collection, has_common_fund,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Game not found".to_string()))?;

        sqlx::query("DELETE FROM game_players WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM common_fund_claims WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM seasonal_collection_claims WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(game)
    }

    /// Delete a game (cascades to players, claims and ledger entries)
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}

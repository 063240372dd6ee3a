use crate::error::RepositoryError;
use crate::models::{GamePlayer, PlayerWithUser};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for game membership data access
pub struct GamePlayerRepository {
    pool: PgPool,
}

impl GamePlayerRepository {
    /// Create a new GamePlayerRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a player to a game, seeded with the game's initial balance
    pub async fn add_player(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        initial_balance: Decimal,
    ) -> Result<GamePlayer, RepositoryError> {
        let player = sqlx::query_as::<_, GamePlayer>(
            r#"
            INSERT INTO game_players (game_id, user_id, current_balance)
            VALUES ($1, $2, $3)
            RETURNING game_id, user_id, current_balance, created_at, updated_at
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .bind(initial_balance)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Duplicate(_) => {
                RepositoryError::Duplicate("Player is already in this game".to_string())
            }
            other => other,
        })?;

        Ok(player)
    }

    /// Remove a player from a game
    pub async fn remove_player(&self, game_id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM game_players
            WHERE game_id = $1 AND user_id = $2
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Check if a user is a member of a game
    pub async fn is_member(&self, game_id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        let row: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM game_players
            WHERE game_id = $1 AND user_id = $2
            LIMIT 1
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Find a membership row
    pub async fn find(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GamePlayer>, RepositoryError> {
        let player = sqlx::query_as::<_, GamePlayer>(
            r#"
            SELECT game_id, user_id, current_balance, created_at, updated_at
            FROM game_players
            WHERE game_id = $1 AND user_id = $2
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(player)
    }

    /// Get a player's current balance in a game
    pub async fn get_balance(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT current_balance
            FROM game_players
            WHERE game_id = $1 AND user_id = $2
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    /// Find all players of a game joined with their user data
    pub async fn find_by_game_with_users(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<PlayerWithUser>, RepositoryError> {
        let players = sqlx::query_as::<_, PlayerWithUser>(
            r#"
            SELECT p.game_id, p.user_id, u.username, u.avatar, p.current_balance, p.created_at
            FROM game_players p
            INNER JOIN users u ON u.id = p.user_id
            WHERE p.game_id = $1
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(players)
    }

    /// Get player count for a game
    pub async fn count_by_game(&self, game_id: Uuid) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM game_players
            WHERE game_id = $1
            "#,
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Sum of all player balances in a game (money in circulation)
    pub async fn sum_balances(&self, game_id: Uuid) -> Result<Decimal, RepositoryError> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(current_balance), 0)
            FROM game_players
            WHERE game_id = $1
            "#,
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

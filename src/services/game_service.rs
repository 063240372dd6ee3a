//! Game lifecycle: creation with a join PIN, joining, leaving and the
//! forward-only status machine.

use crate::error::{option_to_result, AppError, AppResult};
use crate::models::{Game, GameStatus, PlayerWithUser};
use crate::repositories::{GamePlayerRepository, GameRepository, UserRepository};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const PIN_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PIN_LENGTH: usize = 6;
const MAX_PIN_ATTEMPTS: usize = 10;

/// Parameters for creating a game
#[derive(Debug, Clone)]
pub struct CreateGameParams {
    pub name: String,
    pub description: Option<String>,
    pub initial_balance: Decimal,
    pub max_players: i32,
    /// Defaults to 500 when not given
    pub max_transfer: Option<Decimal>,
    /// Defaults to 30 when not given
    pub seasonal_collection: Option<Decimal>,
    pub has_common_fund: bool,
}

/// Service for managing games and memberships
pub struct GameService {
    game_repo: Arc<GameRepository>,
    player_repo: Arc<GamePlayerRepository>,
    user_repo: Arc<UserRepository>,
}

impl GameService {
    pub fn new(
        game_repo: Arc<GameRepository>,
        player_repo: Arc<GamePlayerRepository>,
        user_repo: Arc<UserRepository>,
    ) -> Self {
        Self {
            game_repo,
            player_repo,
            user_repo,
        }
    }

    /// Generate a 6-character join PIN (uppercase letters and digits)
    fn generate_pin() -> String {
        let mut rng = rand::thread_rng();
        (0..PIN_LENGTH)
            .map(|_| PIN_CHARS[rng.gen_range(0..PIN_CHARS.len())] as char)
            .collect()
    }

    /// Create a new game. The creator auto-joins seeded with the initial
    /// balance; this seeding is the only point where money is created.
    pub async fn create_game(&self, creator_id: Uuid, params: CreateGameParams) -> AppResult<Game> {
        info!("Creating game: name={}, creator={}", params.name, creator_id);

        if params.max_players < 2 || params.max_players > 8 {
            return Err(AppError::InvalidArgument(
                "Player count must be between 2 and 8".to_string(),
            ));
        }

        if params.initial_balance < Decimal::ZERO {
            return Err(AppError::InvalidArgument(
                "Initial balance cannot be negative".to_string(),
            ));
        }

        let max_transfer = params.max_transfer.unwrap_or_else(|| Decimal::from(500));
        if max_transfer < Decimal::from(5) || max_transfer > Decimal::from(500) {
            return Err(AppError::InvalidArgument(
                "Max transfer must be between 5 and 500".to_string(),
            ));
        }

        let seasonal_collection = params
            .seasonal_collection
            .unwrap_or_else(|| Decimal::from(30));
        if seasonal_collection < Decimal::ZERO || seasonal_collection > Decimal::from(500) {
            return Err(AppError::InvalidArgument(
                "Seasonal collection must be between 0 and 500".to_string(),
            ));
        }

        option_to_result(
            self.user_repo.find_by_id(creator_id).await?,
            "Creator not found",
        )?;

        // Retry PIN generation until it is unique
        let mut pin = Self::generate_pin();
        let mut attempts = 0;
        while self.game_repo.find_by_pin(&pin).await?.is_some() {
            attempts += 1;
            if attempts >= MAX_PIN_ATTEMPTS {
                return Err(AppError::Conflict(
                    "Could not generate a unique game PIN, try again later".to_string(),
                ));
            }
            pin = Self::generate_pin();
        }

        let game = self
            .game_repo
            .create(
                creator_id,
                &params.name,
                &pin,
                params.description.as_deref(),
                params.initial_balance,
                params.max_players,
                max_transfer,
                seasonal_collection,
                params.has_common_fund,
            )
            .await
            .map_err(AppError::from)?;

        info!("Created game {} ({})", game.name, game.id);
        Ok(game)
    }

    /// Get a game with its players
    pub async fn get_game(&self, game_id: Uuid) -> AppResult<(Game, Vec<PlayerWithUser>)> {
        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        let players = self
            .player_repo
            .find_by_game_with_users(game_id)
            .await
            .map_err(AppError::from)?;

        Ok((game, players))
    }

    /// All games still accepting activity, with player counts
    pub async fn get_open_games(&self) -> AppResult<Vec<(Game, i64)>> {
        let games = self.game_repo.find_open().await.map_err(AppError::from)?;

        let mut with_counts = Vec::with_capacity(games.len());
        for game in games {
            let count = self
                .player_repo
                .count_by_game(game.id)
                .await
                .map_err(AppError::from)?;
            with_counts.push((game, count));
        }

        Ok(with_counts)
    }

    /// All games the user created or participates in, with player counts
    pub async fn get_user_games(&self, user_id: Uuid) -> AppResult<Vec<(Game, i64)>> {
        let games = self
            .game_repo
            .find_by_user(user_id)
            .await
            .map_err(AppError::from)?;

        let mut with_counts = Vec::with_capacity(games.len());
        for game in games {
            let count = self
                .player_repo
                .count_by_game(game.id)
                .await
                .map_err(AppError::from)?;
            with_counts.push((game, count));
        }

        Ok(with_counts)
    }

    /// Join a game by PIN, seeded with the game's initial balance.
    /// Joining a game you are already in just returns the game.
    pub async fn join_game(&self, user_id: Uuid, pin: &str) -> AppResult<Game> {
        let game = option_to_result(
            self.game_repo.find_by_pin(&pin.to_uppercase()).await?,
            "Game not found, check the PIN",
        )?;

        if game.is_finished() {
            return Err(AppError::Conflict("The game has finished".to_string()));
        }

        if self
            .player_repo
            .is_member(game.id, user_id)
            .await
            .map_err(AppError::from)?
        {
            return Ok(game);
        }

        let player_count = self
            .player_repo
            .count_by_game(game.id)
            .await
            .map_err(AppError::from)?;
        if player_count >= game.max_players as i64 {
            return Err(AppError::Conflict("The game is full".to_string()));
        }

        self.player_repo
            .add_player(game.id, user_id, game.initial_balance)
            .await
            .map_err(AppError::from)?;

        info!("User {} joined game {}", user_id, game.id);
        Ok(game)
    }

    /// Leave a game. The creator leaving deletes the entire game; anyone
    /// else only loses their membership (their ledger entries remain).
    pub async fn leave_game(&self, user_id: Uuid, game_id: Uuid) -> AppResult<()> {
        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if game.is_creator(user_id) {
            self.game_repo.delete(game_id).await.map_err(AppError::from)?;
            info!("Creator {} left, deleted game {}", user_id, game_id);
        } else {
            let removed = self
                .player_repo
                .remove_player(game_id, user_id)
                .await
                .map_err(AppError::from)?;
            if !removed {
                return Err(AppError::NotFound("You are not in this game".to_string()));
            }
            info!("User {} left game {}", user_id, game_id);
        }

        Ok(())
    }

    /// Move a game forward through its lifecycle. Only the creator may do
    /// this, and only in the pending -> active -> finished direction.
    /// Finishing removes the game's players and claims; the game row and
    /// the ledger remain.
    pub async fn update_game_status(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        status: GameStatus,
    ) -> AppResult<Game> {
        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if !game.is_creator(caller_id) {
            return Err(AppError::Unauthorized(
                "Only the game's creator can change its status".to_string(),
            ));
        }

        if !game.status_enum().can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Cannot move game from {} to {}",
                game.status,
                status.as_str()
            )));
        }

        let updated = if status == GameStatus::Finished {
            self.game_repo.finish(game_id).await.map_err(AppError::from)?
        } else {
            self.game_repo
                .update_status(game_id, status)
                .await
                .map_err(AppError::from)?
        };

        info!("Game {} moved to {}", game_id, updated.status);
        Ok(updated)
    }

    /// Get a player's current balance in a game
    pub async fn get_player_balance(&self, game_id: Uuid, user_id: Uuid) -> AppResult<Decimal> {
        let balance = self
            .player_repo
            .get_balance(game_id, user_id)
            .await
            .map_err(AppError::from)?;

        option_to_result(balance, "Player not found in this game")
    }
}

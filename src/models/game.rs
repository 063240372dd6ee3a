use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Game lifecycle status
///
/// Transitions are monotonic: pending -> active -> finished. A game never
/// moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Pending,
    Active,
    Finished,
}

impl GameStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(GameStatus::Pending),
            "active" => Ok(GameStatus::Active),
            "finished" => Ok(GameStatus::Finished),
            _ => Err(format!("Invalid game status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Pending => "pending",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            GameStatus::Pending => 0,
            GameStatus::Active => 1,
            GameStatus::Finished => 2,
        }
    }

    /// Whether moving to `next` respects the forward-only lifecycle
    pub fn can_transition_to(&self, next: GameStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl From<String> for GameStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(GameStatus::Pending)
    }
}

impl From<GameStatus> for String {
    fn from(status: GameStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Game model representing one shared-money session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    /// 6-character uppercase alphanumeric join code
    pub pin: String,
    pub description: Option<String>,
    pub status: String, // Stored as TEXT in DB, use GameStatus enum for type safety
    pub initial_balance: Decimal,
    pub max_players: i32,
    /// Upper bound for a single player-to-player transfer
    pub max_transfer: Decimal,
    /// Fixed per-season collection amount for seasonal claims
    pub seasonal_collection: Decimal,
    pub has_common_fund: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Game {
    /// Get the status as an enum
    pub fn status_enum(&self) -> GameStatus {
        GameStatus::from_str(&self.status).unwrap_or(GameStatus::Pending)
    }

    /// Check if the game has finished
    pub fn is_finished(&self) -> bool {
        self.status_enum() == GameStatus::Finished
    }

    /// Check if `user_id` is the game's creator (the bank)
    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }
}

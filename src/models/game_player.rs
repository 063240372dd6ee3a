use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's membership in a game, carrying their mutable balance.
///
/// The balance is mutated exclusively by the balance engine; every change
/// is paired with exactly one ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GamePlayer {
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub current_balance: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Membership row joined with user display data
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlayerWithUser {
    pub game_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub current_balance: Decimal,
    pub created_at: NaiveDateTime,
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User account referenced by memberships, ledger entries and claims
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Create a new User (typically used for creating from API input)
    pub fn new(username: String, avatar: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            avatar,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

//! Claim models for payouts from the common fund

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Claim state machine: pending -> approved | rejected.
///
/// Approved and rejected are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            _ => Err(format!("Invalid claim status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected claims never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }
}

/// Request by a player to receive the entire common fund
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommonFundClaim {
    pub id: Uuid,
    pub game_id: Uuid,
    pub requester_user_id: Uuid,
    pub status: String, // Stored as TEXT in DB, use ClaimStatus enum for type safety
    pub resolved_by_user_id: Option<Uuid>,
    pub resolved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl CommonFundClaim {
    /// Get the status as an enum
    pub fn status_enum(&self) -> ClaimStatus {
        ClaimStatus::from_str(&self.status).unwrap_or(ClaimStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status_enum() == ClaimStatus::Pending
    }
}

/// Pending common-fund claim joined with requester display data
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommonFundClaimWithRequester {
    pub id: Uuid,
    pub game_id: Uuid,
    pub requester_user_id: Uuid,
    pub requester_username: String,
    pub requester_avatar: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// Request for the fixed per-season collection amount from the common fund
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeasonalCollectionClaim {
    pub id: Uuid,
    pub game_id: Uuid,
    pub requester_user_id: Uuid,
    /// Fixed at request time from the game's configured collection amount
    pub amount: Decimal,
    pub status: String,
    pub resolved_by_user_id: Option<Uuid>,
    pub resolved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl SeasonalCollectionClaim {
    /// Get the status as an enum
    pub fn status_enum(&self) -> ClaimStatus {
        ClaimStatus::from_str(&self.status).unwrap_or(ClaimStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status_enum() == ClaimStatus::Pending
    }
}

/// Pending seasonal claim joined with requester display data
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeasonalCollectionClaimWithRequester {
    pub id: Uuid,
    pub game_id: Uuid,
    pub requester_user_id: Uuid,
    pub requester_username: String,
    pub requester_avatar: Option<String>,
    pub amount: Decimal,
    pub status: String,
    pub created_at: NaiveDateTime,
}

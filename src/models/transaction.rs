//! Ledger entry model for money movements

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Transaction types for money movements
///
/// A null `from_user_id` means the money came from the bank or the common
/// fund depending on the type; a null `to_user_id` means it went there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    PlayerToPlayer,
    PlayerToBank,
    BankToPlayer,
    PlayerToCommonFund,
    CommonFundToPlayer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayerToPlayer => "player_to_player",
            Self::PlayerToBank => "player_to_bank",
            Self::BankToPlayer => "bank_to_player",
            Self::PlayerToCommonFund => "player_to_common_fund",
            Self::CommonFundToPlayer => "common_fund_to_player",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "player_to_player" => Some(Self::PlayerToPlayer),
            "player_to_bank" => Some(Self::PlayerToBank),
            "bank_to_player" => Some(Self::BankToPlayer),
            "player_to_common_fund" => Some(Self::PlayerToCommonFund),
            "common_fund_to_player" => Some(Self::CommonFundToPlayer),
            _ => None,
        }
    }
}

/// Immutable ledger entry recording one money movement
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub game_id: Uuid,
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub amount: Decimal,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Transaction {
    pub fn tx_type(&self) -> Option<TransactionType> {
        TransactionType::from_str(&self.tx_type)
    }
}

/// Ledger entry joined with the display names of both parties
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameTransactionView {
    pub id: Uuid,
    pub game_id: Uuid,
    pub from_user_id: Option<Uuid>,
    pub from_username: Option<String>,
    pub to_user_id: Option<Uuid>,
    pub to_username: Option<String>,
    pub amount: Decimal,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

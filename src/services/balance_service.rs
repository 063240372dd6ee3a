//! Balance engine: validates and executes point-to-point transfers.
//!
//! Game existence and membership are re-verified on every call; nothing is
//! cached between calls. The repositories execute each mutation and its
//! ledger append inside one database transaction.

use crate::error::{option_to_result, AppError, AppResult};
use crate::models::{GameTransactionView, Transaction};
use crate::repositories::{BalanceRepository, GamePlayerRepository, GameRepository};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// One player's row in the financial summary
#[derive(Debug, Clone, Serialize)]
pub struct PlayerBalance {
    pub user_id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub balance: Decimal,
}

/// Aggregated money picture of a game for display
#[derive(Debug, Clone, Serialize)]
pub struct FinancialSummary {
    pub game_id: Uuid,
    pub game_name: String,
    pub status: String,
    pub players: Vec<PlayerBalance>,
    pub has_common_fund: bool,
    pub bank_balance: Decimal,
    pub common_fund_balance: Decimal,
    /// Player balances + bank + fund; constant across transfers
    pub total_balance: Decimal,
    pub player_count: usize,
    pub max_players: i32,
    pub max_transfer: Decimal,
}

/// Service for transfers and balance queries
pub struct BalanceService {
    game_repo: Arc<GameRepository>,
    player_repo: Arc<GamePlayerRepository>,
    balance_repo: Arc<BalanceRepository>,
}

impl BalanceService {
    pub fn new(
        game_repo: Arc<GameRepository>,
        player_repo: Arc<GamePlayerRepository>,
        balance_repo: Arc<BalanceRepository>,
    ) -> Self {
        Self {
            game_repo,
            player_repo,
            balance_repo,
        }
    }

    fn validate_amount(amount: Decimal) -> AppResult<()> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidArgument(
                "Amount must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Transfer money between two players of the same game
    pub async fn transfer_player_to_player(
        &self,
        game_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> AppResult<Transaction> {
        info!(
            "Player transfer: game={}, from={}, to={}, amount={}",
            game_id, from_user_id, to_user_id, amount
        );

        Self::validate_amount(amount)?;

        if from_user_id == to_user_id {
            return Err(AppError::InvalidArgument(
                "Cannot transfer money to yourself".to_string(),
            ));
        }

        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if amount > game.max_transfer {
            return Err(AppError::InvalidArgument(format!(
                "Amount exceeds the per-operation transfer limit of {}",
                game.max_transfer
            )));
        }

        let entry = self
            .balance_repo
            .transfer_between_players(game_id, from_user_id, to_user_id, amount, description)
            .await
            .map_err(AppError::from)?;

        Ok(entry)
    }

    /// Pay money from a player to the bank
    pub async fn transfer_player_to_bank(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> AppResult<Transaction> {
        info!(
            "Bank payment: game={}, from={}, amount={}",
            game_id, user_id, amount
        );

        Self::validate_amount(amount)?;

        option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        let entry = self
            .balance_repo
            .transfer_to_bank(game_id, user_id, amount, description)
            .await
            .map_err(AppError::from)?;

        Ok(entry)
    }

    /// Pay money from the bank to a player. Only the game's creator may do
    /// this; the bank has no lower bound.
    pub async fn withdraw_from_bank(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> AppResult<Transaction> {
        info!(
            "Bank withdrawal: game={}, by={}, to={}, amount={}",
            game_id, caller_id, to_user_id, amount
        );

        Self::validate_amount(amount)?;

        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if !game.is_creator(caller_id) {
            return Err(AppError::Unauthorized(
                "Only the game's creator can withdraw from the bank".to_string(),
            ));
        }

        let entry = self
            .balance_repo
            .withdraw_from_bank(game_id, to_user_id, amount, description)
            .await
            .map_err(AppError::from)?;

        Ok(entry)
    }

    /// Contribute money from a player to the common fund
    pub async fn transfer_player_to_common_fund(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> AppResult<Transaction> {
        info!(
            "Common fund contribution: game={}, from={}, amount={}",
            game_id, user_id, amount
        );

        Self::validate_amount(amount)?;

        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if !game.has_common_fund {
            return Err(AppError::FeatureDisabled(
                "This game has no common fund".to_string(),
            ));
        }

        let entry = self
            .balance_repo
            .transfer_to_common_fund(game_id, user_id, amount, description)
            .await
            .map_err(AppError::from)?;

        Ok(entry)
    }

    /// Derived bank balance of a game
    pub async fn get_bank_balance(&self, game_id: Uuid) -> AppResult<Decimal> {
        option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        let balance = self
            .balance_repo
            .bank_balance(game_id)
            .await
            .map_err(AppError::from)?;

        Ok(balance)
    }

    /// Derived common-fund balance of a game; zero when the feature is off
    pub async fn get_common_fund_balance(&self, game_id: Uuid) -> AppResult<Decimal> {
        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if !game.has_common_fund {
            return Ok(Decimal::ZERO);
        }

        let balance = self
            .balance_repo
            .common_fund_balance(game_id)
            .await
            .map_err(AppError::from)?;

        Ok(balance)
    }

    /// Aggregated balances of all players, the bank and the fund
    pub async fn get_financial_summary(&self, game_id: Uuid) -> AppResult<FinancialSummary> {
        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        let players = self
            .player_repo
            .find_by_game_with_users(game_id)
            .await
            .map_err(AppError::from)?;

        let bank_balance = self
            .balance_repo
            .bank_balance(game_id)
            .await
            .map_err(AppError::from)?;

        let common_fund_balance = if game.has_common_fund {
            self.balance_repo
                .common_fund_balance(game_id)
                .await
                .map_err(AppError::from)?
        } else {
            Decimal::ZERO
        };

        let total_player_balance: Decimal = players.iter().map(|p| p.current_balance).sum();
        let player_count = players.len();

        Ok(FinancialSummary {
            game_id,
            game_name: game.name,
            status: game.status,
            players: players
                .into_iter()
                .map(|p| PlayerBalance {
                    user_id: p.user_id,
                    username: p.username,
                    avatar: p.avatar,
                    balance: p.current_balance,
                })
                .collect(),
            has_common_fund: game.has_common_fund,
            bank_balance,
            common_fund_balance,
            total_balance: total_player_balance + bank_balance + common_fund_balance,
            player_count,
            max_players: game.max_players,
            max_transfer: game.max_transfer,
        })
    }

    /// Full transaction history of a game, newest first
    pub async fn get_game_transaction_history(
        &self,
        game_id: Uuid,
    ) -> AppResult<Vec<GameTransactionView>> {
        option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        let entries = self
            .balance_repo
            .game_history(game_id)
            .await
            .map_err(AppError::from)?;

        Ok(entries)
    }

    /// Transaction history of a game restricted to a time window
    pub async fn get_game_transactions_between(
        &self,
        game_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> AppResult<Vec<GameTransactionView>> {
        option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        let entries = self
            .balance_repo
            .game_history_between(game_id, start, end)
            .await
            .map_err(AppError::from)?;

        Ok(entries)
    }

    /// One user's transactions within a game; the user must be a member
    pub async fn get_user_transactions_in_game(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<Transaction>> {
        option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if !self
            .player_repo
            .is_member(game_id, user_id)
            .await
            .map_err(AppError::from)?
        {
            return Err(AppError::Unauthorized(
                "You are not in this game".to_string(),
            ));
        }

        let entries = self
            .balance_repo
            .user_transactions_in_game(game_id, user_id)
            .await
            .map_err(AppError::from)?;

        Ok(entries)
    }
}

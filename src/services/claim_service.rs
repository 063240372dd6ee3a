//! Claim engine: arbitrates multi-party claims on the common fund.
//!
//! Requests are filed by any member; only the game's creator resolves them.
//! When the creator is the requester the claim is auto-approved so the bank
//! does not have to adjudicate its own request. The repository layer makes
//! every resolution atomic and the store enforces the one-pending-claim
//! invariants.

use crate::error::{option_to_result, AppError, AppResult};
use crate::models::{
    CommonFundClaim, CommonFundClaimWithRequester, Game, SeasonalCollectionClaim,
    SeasonalCollectionClaimWithRequester,
};
use crate::repositories::{BalanceRepository, ClaimRepository, GamePlayerRepository, GameRepository};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Outcome of filing a common-fund claim
#[derive(Debug, Clone, Serialize)]
pub struct CommonFundClaimResult {
    pub claim: CommonFundClaim,
    pub auto_approved: bool,
    /// Fund balance at request time; informational unless auto-approved
    pub amount: Decimal,
}

/// Outcome of filing a seasonal-collection claim
#[derive(Debug, Clone, Serialize)]
pub struct SeasonalClaimResult {
    pub claim: SeasonalCollectionClaim,
    pub auto_approved: bool,
    pub amount: Decimal,
}

/// Service for the claim request/approve/reject workflow
pub struct ClaimService {
    game_repo: Arc<GameRepository>,
    player_repo: Arc<GamePlayerRepository>,
    balance_repo: Arc<BalanceRepository>,
    claim_repo: Arc<ClaimRepository>,
}

impl ClaimService {
    pub fn new(
        game_repo: Arc<GameRepository>,
        player_repo: Arc<GamePlayerRepository>,
        balance_repo: Arc<BalanceRepository>,
        claim_repo: Arc<ClaimRepository>,
    ) -> Self {
        Self {
            game_repo,
            player_repo,
            balance_repo,
            claim_repo,
        }
    }

    /// Common validation for claim requests: the game exists, has a common
    /// fund, and the requester is a member.
    async fn validate_claim_request(&self, game_id: Uuid, requester: Uuid) -> AppResult<Game> {
        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if !game.has_common_fund {
            return Err(AppError::FeatureDisabled(
                "This game has no common fund".to_string(),
            ));
        }

        if !self
            .player_repo
            .is_member(game_id, requester)
            .await
            .map_err(AppError::from)?
        {
            return Err(AppError::Unauthorized(
                "You are not in this game".to_string(),
            ));
        }

        Ok(game)
    }

    /// Load a claim's game and check the caller is its creator
    async fn authorize_resolver(&self, game_id: Uuid, caller_id: Uuid) -> AppResult<Game> {
        let game = option_to_result(self.game_repo.find_by_id(game_id).await?, "Game not found")?;

        if !game.is_creator(caller_id) {
            return Err(AppError::Unauthorized(
                "Only the game's creator can resolve claims".to_string(),
            ));
        }

        Ok(game)
    }

    // =========================================================================
    // Common Fund Claims
    // =========================================================================

    /// Request the entire common fund.
    ///
    /// The creator's own request is auto-approved and paid immediately; any
    /// other member files a pending claim for the creator to resolve.
    pub async fn request_common_fund_claim(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
    ) -> AppResult<CommonFundClaimResult> {
        info!(
            "Common fund claim request: game={}, requester={}",
            game_id, requester_user_id
        );

        let game = self.validate_claim_request(game_id, requester_user_id).await?;

        let fund_balance = self
            .balance_repo
            .common_fund_balance(game_id)
            .await
            .map_err(AppError::from)?;
        if fund_balance <= Decimal::ZERO {
            return Err(AppError::EmptyFund);
        }

        if self
            .claim_repo
            .find_pending_common_fund_by_game(game_id)
            .await
            .map_err(AppError::from)?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A pending common fund claim already exists for this game".to_string(),
            ));
        }

        if game.is_creator(requester_user_id) {
            let (claim, amount) = self
                .claim_repo
                .create_auto_approved_common_fund(game_id, requester_user_id)
                .await
                .map_err(AppError::from)?;

            info!("Common fund claim {} auto-approved for {}", claim.id, amount);
            return Ok(CommonFundClaimResult {
                claim,
                auto_approved: true,
                amount,
            });
        }

        let claim = self
            .claim_repo
            .create_pending_common_fund(game_id, requester_user_id)
            .await
            .map_err(AppError::from)?;

        Ok(CommonFundClaimResult {
            claim,
            auto_approved: false,
            amount: fund_balance,
        })
    }

    /// Approve a pending claim and pay out the fund balance as derived at
    /// approval time. Returns the resolved claim and the amount paid.
    pub async fn approve_common_fund_claim(
        &self,
        claim_id: Uuid,
        caller_id: Uuid,
    ) -> AppResult<(CommonFundClaim, Decimal)> {
        let claim = option_to_result(
            self.claim_repo.find_common_fund_by_id(claim_id).await?,
            "Claim not found",
        )?;

        self.authorize_resolver(claim.game_id, caller_id).await?;

        let (resolved, amount) = self
            .claim_repo
            .approve_common_fund(claim_id, caller_id)
            .await
            .map_err(AppError::from)?;

        info!(
            "Common fund claim {} approved by {}, paid {}",
            claim_id, caller_id, amount
        );
        Ok((resolved, amount))
    }

    /// Reject a pending claim. No money moves.
    pub async fn reject_common_fund_claim(
        &self,
        claim_id: Uuid,
        caller_id: Uuid,
    ) -> AppResult<CommonFundClaim> {
        let claim = option_to_result(
            self.claim_repo.find_common_fund_by_id(claim_id).await?,
            "Claim not found",
        )?;

        self.authorize_resolver(claim.game_id, caller_id).await?;

        let resolved = self
            .claim_repo
            .reject_common_fund(claim_id, caller_id)
            .await
            .map_err(AppError::from)?;

        info!("Common fund claim {} rejected by {}", claim_id, caller_id);
        Ok(resolved)
    }

    /// Pending claims with requester data; creator-only view
    pub async fn get_pending_common_fund_claims(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
    ) -> AppResult<Vec<CommonFundClaimWithRequester>> {
        self.authorize_resolver(game_id, caller_id).await?;

        let claims = self
            .claim_repo
            .pending_common_fund_with_requester(game_id)
            .await
            .map_err(AppError::from)?;

        Ok(claims)
    }

    /// The caller's most recent claim in a game, regardless of status
    pub async fn get_my_latest_common_fund_claim(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<CommonFundClaim>> {
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

        let claim = self
            .claim_repo
            .latest_common_fund_by_requester(game_id, user_id)
            .await
            .map_err(AppError::from)?;

        Ok(claim)
    }

    // =========================================================================
    // Seasonal Collection Claims
    // =========================================================================

    /// Request the game's fixed seasonal collection amount from the fund.
    ///
    /// The amount is fixed at request time. A requester can hold many
    /// historical claims but only one pending claim per game.
    pub async fn request_seasonal_collection_claim(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
    ) -> AppResult<SeasonalClaimResult> {
        info!(
            "Seasonal collection claim request: game={}, requester={}",
            game_id, requester_user_id
        );

        let game = self.validate_claim_request(game_id, requester_user_id).await?;

        let amount = game.seasonal_collection;
        if amount <= Decimal::ZERO {
            return Err(AppError::FeatureDisabled(
                "This game has no seasonal collection".to_string(),
            ));
        }

        let fund_balance = self
            .balance_repo
            .common_fund_balance(game_id)
            .await
            .map_err(AppError::from)?;
        if fund_balance < amount {
            return Err(AppError::EmptyFund);
        }

        if self
            .claim_repo
            .find_pending_seasonal_by_requester(game_id, requester_user_id)
            .await
            .map_err(AppError::from)?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You already have a pending seasonal collection claim".to_string(),
            ));
        }

        if game.is_creator(requester_user_id) {
            let (claim, amount) = self
                .claim_repo
                .create_auto_approved_seasonal(game_id, requester_user_id, amount)
                .await
                .map_err(AppError::from)?;

            info!("Seasonal claim {} auto-approved for {}", claim.id, amount);
            return Ok(SeasonalClaimResult {
                claim,
                auto_approved: true,
                amount,
            });
        }

        let claim = self
            .claim_repo
            .create_pending_seasonal(game_id, requester_user_id, amount)
            .await
            .map_err(AppError::from)?;

        Ok(SeasonalClaimResult {
            claim,
            auto_approved: false,
            amount,
        })
    }

    /// Approve a pending seasonal claim and pay out its fixed amount
    pub async fn approve_seasonal_collection_claim(
        &self,
        claim_id: Uuid,
        caller_id: Uuid,
    ) -> AppResult<(SeasonalCollectionClaim, Decimal)> {
        let claim = option_to_result(
            self.claim_repo.find_seasonal_by_id(claim_id).await?,
            "Claim not found",
        )?;

        self.authorize_resolver(claim.game_id, caller_id).await?;

        let (resolved, amount) = self
            .claim_repo
            .approve_seasonal(claim_id, caller_id)
            .await
            .map_err(AppError::from)?;

        info!(
            "Seasonal claim {} approved by {}, paid {}",
            claim_id, caller_id, amount
        );
        Ok((resolved, amount))
    }

    /// Reject a pending seasonal claim. No money moves.
    pub async fn reject_seasonal_collection_claim(
        &self,
        claim_id: Uuid,
        caller_id: Uuid,
    ) -> AppResult<SeasonalCollectionClaim> {
        let claim = option_to_result(
            self.claim_repo.find_seasonal_by_id(claim_id).await?,
            "Claim not found",
        )?;

        self.authorize_resolver(claim.game_id, caller_id).await?;

        let resolved = self
            .claim_repo
            .reject_seasonal(claim_id, caller_id)
            .await
            .map_err(AppError::from)?;

        info!("Seasonal claim {} rejected by {}", claim_id, caller_id);
        Ok(resolved)
    }

    /// Pending seasonal claims with requester data; creator-only view
    pub async fn get_pending_seasonal_collection_claims(
        &self,
        game_id: Uuid,
        caller_id: Uuid,
    ) -> AppResult<Vec<SeasonalCollectionClaimWithRequester>> {
        self.authorize_resolver(game_id, caller_id).await?;

        let claims = self
            .claim_repo
            .pending_seasonal_with_requester(game_id)
            .await
            .map_err(AppError::from)?;

        Ok(claims)
    }

    /// The caller's most recent seasonal claim in a game, regardless of status
    pub async fn get_my_latest_seasonal_collection_claim(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<SeasonalCollectionClaim>> {
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

        let claim = self
            .claim_repo
            .latest_seasonal_by_requester(game_id, user_id)
            .await
            .map_err(AppError::from)?;

        Ok(claim)
    }
}

//! Repository for common-fund and seasonal-collection claims
//!
//! Resolution methods lock the claim row, re-check its status, compute the
//! payout against the derived fund balance and credit the requester all in
//! one transaction, so a claim can never pay out twice and a resolved claim
//! never changes again. The one-pending-claim invariants are backed by
//! partial unique indexes; a losing insert surfaces as `Duplicate`.

use crate::error::RepositoryError;
use crate::models::{
    ClaimStatus, CommonFundClaim, CommonFundClaimWithRequester, SeasonalCollectionClaim,
    SeasonalCollectionClaimWithRequester, TransactionType,
};
use crate::repositories::balance_repository::{
    append_ledger_entry, common_fund_balance_tx, credit_membership,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ClaimRepository {
    pool: PgPool,
}

impl ClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Common Fund Claims
    // =========================================================================

    /// File a pending claim for the whole common fund
    pub async fn create_pending_common_fund(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<CommonFundClaim, RepositoryError> {
        let claim = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            INSERT INTO common_fund_claims (game_id, requester_user_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, game_id, requester_user_id, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(game_id)
        .bind(requester_user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Duplicate(_) => RepositoryError::Duplicate(
                "A pending common fund claim already exists for this game".to_string(),
            ),
            other => other,
        })?;

        Ok(claim)
    }

    /// Pay the whole fund to the requester and record the claim already
    /// approved, in one transaction. Used when the bank claims its own fund.
    pub async fn create_auto_approved_common_fund(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<(CommonFundClaim, Decimal), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let fund_balance = common_fund_balance_tx(&mut tx, game_id).await?;
        if fund_balance <= Decimal::ZERO {
            return Err(RepositoryError::EmptyFund);
        }

        credit_membership(&mut tx, game_id, requester_user_id, fund_balance)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound("Requesting player is not in this game".to_string())
            })?;

        append_ledger_entry(
            &mut tx,
            game_id,
            None,
            Some(requester_user_id),
            fund_balance,
            TransactionType::CommonFundToPlayer,
            Some("Direct collection of the common fund by the bank"),
        )
        .await?;

        let claim = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            INSERT INTO common_fund_claims
            (game_id, requester_user_id, status, resolved_by_user_id, resolved_at)
            VALUES ($1, $2, 'approved', $2, NOW())
            RETURNING id, game_id, requester_user_id, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(game_id)
        .bind(requester_user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((claim, fund_balance))
    }

    /// Find a claim by ID
    pub async fn find_common_fund_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<CommonFundClaim>, RepositoryError> {
        let claim = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            SELECT id, game_id, requester_user_id, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM common_fund_claims
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }

    /// Find the game's pending claim, if any
    pub async fn find_pending_common_fund_by_game(
        &self,
        game_id: Uuid,
    ) -> Result<Option<CommonFundClaim>, RepositoryError> {
        let claim = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            SELECT id, game_id, requester_user_id, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM common_fund_claims
            WHERE game_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }

    /// Pending claims joined with requester display data
    pub async fn pending_common_fund_with_requester(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<CommonFundClaimWithRequester>, RepositoryError> {
        let claims = sqlx::query_as::<_, CommonFundClaimWithRequester>(
            r#"
            SELECT c.id, c.game_id, c.requester_user_id,
                   u.username AS requester_username, u.avatar AS requester_avatar,
                   c.status, c.created_at
            FROM common_fund_claims c
            INNER JOIN users u ON u.id = c.requester_user_id
            WHERE c.game_id = $1 AND c.status = 'pending'
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(claims)
    }

    /// A requester's most recent claim in a game, regardless of status
    pub async fn latest_common_fund_by_requester(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<Option<CommonFundClaim>, RepositoryError> {
        let claim = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            SELECT id, game_id, requester_user_id, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM common_fund_claims
            WHERE game_id = $1 AND requester_user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(game_id)
        .bind(requester_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }

    /// Approve a pending claim: pay the fund balance as derived at approval
    /// time, append the ledger entry and flip the claim, atomically.
    pub async fn approve_common_fund(
        &self,
        claim_id: Uuid,
        resolved_by_user_id: Uuid,
    ) -> Result<(CommonFundClaim, Decimal), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claim = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            SELECT id, game_id, requester_user_id, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM common_fund_claims
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(claim_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Claim not found".to_string()))?;

        if claim.status_enum() != ClaimStatus::Pending {
            return Err(RepositoryError::AlreadyResolved(
                "The claim was already resolved".to_string(),
            ));
        }

        // The payout is the fund balance now, not at request time.
        let fund_balance = common_fund_balance_tx(&mut tx, claim.game_id).await?;
        if fund_balance <= Decimal::ZERO {
            return Err(RepositoryError::EmptyFund);
        }

        credit_membership(&mut tx, claim.game_id, claim.requester_user_id, fund_balance)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound("Requesting player is not in this game".to_string())
            })?;

        append_ledger_entry(
            &mut tx,
            claim.game_id,
            None,
            Some(claim.requester_user_id),
            fund_balance,
            TransactionType::CommonFundToPlayer,
            Some("Common fund payout"),
        )
        .await?;

        let resolved = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            UPDATE common_fund_claims
            SET status = 'approved', resolved_by_user_id = $2, resolved_at = NOW()
            WHERE id = $1
            RETURNING id, game_id, requester_user_id, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(claim_id)
        .bind(resolved_by_user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((resolved, fund_balance))
    }

    /// Reject a pending claim. No money moves.
    pub async fn reject_common_fund(
        &self,
        claim_id: Uuid,
        resolved_by_user_id: Uuid,
    ) -> Result<CommonFundClaim, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claim = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            SELECT id, game_id, requester_user_id, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM common_fund_claims
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(claim_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Claim not found".to_string()))?;

        if claim.status_enum() != ClaimStatus::Pending {
            return Err(RepositoryError::AlreadyResolved(
                "The claim was already resolved".to_string(),
            ));
        }

        let resolved = sqlx::query_as::<_, CommonFundClaim>(
            r#"
            UPDATE common_fund_claims
            SET status = 'rejected', resolved_by_user_id = $2, resolved_at = NOW()
            WHERE id = $1
            RETURNING id, game_id, requester_user_id, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(claim_id)
        .bind(resolved_by_user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(resolved)
    }

    // =========================================================================
    // Seasonal Collection Claims
    // =========================================================================

    /// File a pending seasonal-collection claim with its amount fixed now
    pub async fn create_pending_seasonal(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
        amount: Decimal,
    ) -> Result<SeasonalCollectionClaim, RepositoryError> {
        let claim = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            INSERT INTO seasonal_collection_claims (game_id, requester_user_id, amount, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(game_id)
        .bind(requester_user_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Duplicate(_) => RepositoryError::Duplicate(
                "A pending seasonal collection claim already exists for this player".to_string(),
            ),
            other => other,
        })?;

        Ok(claim)
    }

    /// Pay the fixed amount to the requester and record the claim already
    /// approved, in one transaction. Used when the bank claims its own
    /// seasonal collection.
    pub async fn create_auto_approved_seasonal(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
        amount: Decimal,
    ) -> Result<(SeasonalCollectionClaim, Decimal), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let fund_balance = common_fund_balance_tx(&mut tx, game_id).await?;
        if fund_balance < amount {
            return Err(RepositoryError::EmptyFund);
        }

        credit_membership(&mut tx, game_id, requester_user_id, amount)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound("Requesting player is not in this game".to_string())
            })?;

        append_ledger_entry(
            &mut tx,
            game_id,
            None,
            Some(requester_user_id),
            amount,
            TransactionType::CommonFundToPlayer,
            Some("Direct seasonal collection by the bank"),
        )
        .await?;

        let claim = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            INSERT INTO seasonal_collection_claims
            (game_id, requester_user_id, amount, status, resolved_by_user_id, resolved_at)
            VALUES ($1, $2, $3, 'approved', $2, NOW())
            RETURNING id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(game_id)
        .bind(requester_user_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((claim, amount))
    }

    /// Find a seasonal claim by ID
    pub async fn find_seasonal_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<SeasonalCollectionClaim>, RepositoryError> {
        let claim = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            SELECT id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM seasonal_collection_claims
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }

    /// A requester's pending seasonal claim in a game, if any
    pub async fn find_pending_seasonal_by_requester(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<Option<SeasonalCollectionClaim>, RepositoryError> {
        let claim = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            SELECT id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM seasonal_collection_claims
            WHERE game_id = $1 AND requester_user_id = $2 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(game_id)
        .bind(requester_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }

    /// Pending seasonal claims joined with requester display data
    pub async fn pending_seasonal_with_requester(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<SeasonalCollectionClaimWithRequester>, RepositoryError> {
        let claims = sqlx::query_as::<_, SeasonalCollectionClaimWithRequester>(
            r#"
            SELECT c.id, c.game_id, c.requester_user_id,
                   u.username AS requester_username, u.avatar AS requester_avatar,
                   c.amount, c.status, c.created_at
            FROM seasonal_collection_claims c
            INNER JOIN users u ON u.id = c.requester_user_id
            WHERE c.game_id = $1 AND c.status = 'pending'
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(claims)
    }

    /// A requester's most recent seasonal claim in a game, regardless of status
    pub async fn latest_seasonal_by_requester(
        &self,
        game_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<Option<SeasonalCollectionClaim>, RepositoryError> {
        let claim = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            SELECT id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM seasonal_collection_claims
            WHERE game_id = $1 AND requester_user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(game_id)
        .bind(requester_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }

    /// Approve a pending seasonal claim: pay its fixed amount from the fund,
    /// append the ledger entry and flip the claim, atomically.
    pub async fn approve_seasonal(
        &self,
        claim_id: Uuid,
        resolved_by_user_id: Uuid,
    ) -> Result<(SeasonalCollectionClaim, Decimal), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claim = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            SELECT id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM seasonal_collection_claims
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(claim_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Claim not found".to_string()))?;

        if claim.status_enum() != ClaimStatus::Pending {
            return Err(RepositoryError::AlreadyResolved(
                "The claim was already resolved".to_string(),
            ));
        }

        // Amount was fixed at request time; the fund must still cover it.
        let fund_balance = common_fund_balance_tx(&mut tx, claim.game_id).await?;
        if fund_balance < claim.amount {
            return Err(RepositoryError::EmptyFund);
        }

        credit_membership(&mut tx, claim.game_id, claim.requester_user_id, claim.amount)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound("Requesting player is not in this game".to_string())
            })?;

        append_ledger_entry(
            &mut tx,
            claim.game_id,
            None,
            Some(claim.requester_user_id),
            claim.amount,
            TransactionType::CommonFundToPlayer,
            Some("Seasonal collection payout"),
        )
        .await?;

        let resolved = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            UPDATE seasonal_collection_claims
            SET status = 'approved', resolved_by_user_id = $2, resolved_at = NOW()
            WHERE id = $1
            RETURNING id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(claim_id)
        .bind(resolved_by_user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let amount = claim.amount;
        Ok((resolved, amount))
    }

    /// Reject a pending seasonal claim. No money moves.
    pub async fn reject_seasonal(
        &self,
        claim_id: Uuid,
        resolved_by_user_id: Uuid,
    ) -> Result<SeasonalCollectionClaim, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claim = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            SELECT id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                   resolved_at, created_at
            FROM seasonal_collection_claims
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(claim_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Claim not found".to_string()))?;

        if claim.status_enum() != ClaimStatus::Pending {
            return Err(RepositoryError::AlreadyResolved(
                "The claim was already resolved".to_string(),
            ));
        }

        let resolved = sqlx::query_as::<_, SeasonalCollectionClaim>(
            r#"
            UPDATE seasonal_collection_claims
            SET status = 'rejected', resolved_by_user_id = $2, resolved_at = NOW()
            WHERE id = $1
            RETURNING id, game_id, requester_user_id, amount, status, resolved_by_user_id,
                      resolved_at, created_at
            "#,
        )
        .bind(claim_id)
        .bind(resolved_by_user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(resolved)
    }
}

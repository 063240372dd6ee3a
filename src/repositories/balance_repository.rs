//! Repository for balance mutations and ledger aggregation
//!
//! Every mutation here runs inside a single database transaction that locks
//! the membership rows involved, applies the balance change and appends the
//! ledger entry. The balance write and the ledger append share one failure
//! domain: if either fails, neither commits.

use crate::error::RepositoryError;
use crate::models::{GamePlayer, GameTransactionView, Transaction, TransactionType};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as PgTransaction};
use uuid::Uuid;

/// Lock one membership row for the remainder of the transaction
pub(crate) async fn lock_membership(
    tx: &mut PgTransaction<'_, Postgres>,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<Option<GamePlayer>, RepositoryError> {
    let player = sqlx::query_as::<_, GamePlayer>(
        r#"
        SELECT game_id, user_id, current_balance, created_at, updated_at
        FROM game_players
        WHERE game_id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(game_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    Ok(player)
}

/// Credit a membership row in place. Returns the new balance, or None when
/// the membership does not exist.
pub(crate) async fn credit_membership(
    tx: &mut PgTransaction<'_, Postgres>,
    game_id: Uuid,
    user_id: Uuid,
    amount: Decimal,
) -> Result<Option<Decimal>, RepositoryError> {
    let balance: Option<Decimal> = sqlx::query_scalar(
        r#"
        UPDATE game_players
        SET current_balance = current_balance + $3, updated_at = NOW()
        WHERE game_id = $1 AND user_id = $2
        RETURNING current_balance
        "#,
    )
    .bind(game_id)
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *tx)
    .await?;

    Ok(balance)
}

/// Append one immutable ledger entry inside the caller's transaction
pub(crate) async fn append_ledger_entry(
    tx: &mut PgTransaction<'_, Postgres>,
    game_id: Uuid,
    from_user_id: Option<Uuid>,
    to_user_id: Option<Uuid>,
    amount: Decimal,
    tx_type: TransactionType,
    description: Option<&str>,
) -> Result<Transaction, RepositoryError> {
    let entry = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (game_id, from_user_id, to_user_id, amount, type, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, game_id, from_user_id, to_user_id, amount, type, description, created_at
        "#,
    )
    .bind(game_id)
    .bind(from_user_id)
    .bind(to_user_id)
    .bind(amount)
    .bind(tx_type.as_str())
    .bind(description)
    .fetch_one(&mut *tx)
    .await?;

    Ok(entry)
}

/// Derived common-fund balance, computed inside the caller's transaction
pub(crate) async fn common_fund_balance_tx(
    tx: &mut PgTransaction<'_, Postgres>,
    game_id: Uuid,
) -> Result<Decimal, RepositoryError> {
    let balance: Decimal = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(CASE WHEN type = 'player_to_common_fund' THEN amount ELSE -amount END), 0)
        FROM transactions
        WHERE game_id = $1 AND type IN ('player_to_common_fund', 'common_fund_to_player')
        "#,
    )
    .bind(game_id)
    .fetch_one(&mut *tx)
    .await?;

    Ok(balance)
}

pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Transfer Operations
    // =========================================================================

    /// Move money between two players of the same game.
    ///
    /// Memberships are locked in ascending user id order so two opposite
    /// transfers between the same pair cannot deadlock.
    pub async fn transfer_between_players(
        &self,
        game_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (first, second) = if from_user_id < to_user_id {
            (from_user_id, to_user_id)
        } else {
            (to_user_id, from_user_id)
        };

        let first_row = lock_membership(&mut tx, game_id, first).await?;
        let second_row = lock_membership(&mut tx, game_id, second).await?;

        let mut sender: Option<GamePlayer> = None;
        let mut receiver_present = false;
        for row in [first_row, second_row].into_iter().flatten() {
            if row.user_id == from_user_id {
                sender = Some(row);
            } else if row.user_id == to_user_id {
                receiver_present = true;
            }
        }

        let sender = sender
            .ok_or_else(|| RepositoryError::NotFound("Sender is not in this game".to_string()))?;
        if !receiver_present {
            return Err(RepositoryError::NotFound(
                "Receiver is not in this game".to_string(),
            ));
        }

        if sender.current_balance < amount {
            return Err(RepositoryError::InsufficientBalance {
                available: sender.current_balance,
                requested: amount,
            });
        }

        sqlx::query(
            r#"
            UPDATE game_players
            SET current_balance = current_balance - $3, updated_at = NOW()
            WHERE game_id = $1 AND user_id = $2
            "#,
        )
        .bind(game_id)
        .bind(from_user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE game_players
            SET current_balance = current_balance + $3, updated_at = NOW()
            WHERE game_id = $1 AND user_id = $2
            "#,
        )
        .bind(game_id)
        .bind(to_user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        let entry = append_ledger_entry(
            &mut tx,
            game_id,
            Some(from_user_id),
            Some(to_user_id),
            amount,
            TransactionType::PlayerToPlayer,
            description,
        )
        .await?;

        tx.commit().await?;

        Ok(entry)
    }

    /// Debit a player and append the matching outbound ledger entry
    async fn debit_and_append(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        tx_type: TransactionType,
        description: Option<&str>,
    ) -> Result<Transaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let player = lock_membership(&mut tx, game_id, user_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Player is not in this game".to_string()))?;

        if player.current_balance < amount {
            return Err(RepositoryError::InsufficientBalance {
                available: player.current_balance,
                requested: amount,
            });
        }

        sqlx::query(
            r#"
            UPDATE game_players
            SET current_balance = current_balance - $3, updated_at = NOW()
            WHERE game_id = $1 AND user_id = $2
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        let entry =
            append_ledger_entry(&mut tx, game_id, Some(user_id), None, amount, tx_type, description)
                .await?;

        tx.commit().await?;

        Ok(entry)
    }

    /// Pay money from a player to the bank. The bank side is derived, so only
    /// the player row changes.
    pub async fn transfer_to_bank(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction, RepositoryError> {
        self.debit_and_append(game_id, user_id, amount, TransactionType::PlayerToBank, description)
            .await
    }

    /// Contribute money from a player to the common fund
    pub async fn transfer_to_common_fund(
        &self,
        game_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction, RepositoryError> {
        self.debit_and_append(
            game_id,
            user_id,
            amount,
            TransactionType::PlayerToCommonFund,
            description,
        )
        .await
    }

    /// Pay money from the bank to a player. The bank has no stored balance
    /// and no lower bound; only the recipient row changes.
    pub async fn withdraw_from_bank(
        &self,
        game_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<Transaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        credit_membership(&mut tx, game_id, to_user_id, amount)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Player is not in this game".to_string()))?;

        let entry = append_ledger_entry(
            &mut tx,
            game_id,
            None,
            Some(to_user_id),
            amount,
            TransactionType::BankToPlayer,
            description,
        )
        .await?;

        tx.commit().await?;

        Ok(entry)
    }

    // =========================================================================
    // Derived Balances
    // =========================================================================

    /// Bank balance: inflows minus outflows over the ledger
    pub async fn bank_balance(&self, game_id: Uuid) -> Result<Decimal, RepositoryError> {
        let balance: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN type = 'player_to_bank' THEN amount ELSE -amount END), 0)
            FROM transactions
            WHERE game_id = $1 AND type IN ('player_to_bank', 'bank_to_player')
            "#,
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    /// Common-fund balance: contributions minus payouts over the ledger
    pub async fn common_fund_balance(&self, game_id: Uuid) -> Result<Decimal, RepositoryError> {
        let balance: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN type = 'player_to_common_fund' THEN amount ELSE -amount END), 0)
            FROM transactions
            WHERE game_id = $1 AND type IN ('player_to_common_fund', 'common_fund_to_player')
            "#,
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    // =========================================================================
    // Transaction History
    // =========================================================================

    /// Full game history, newest first, with both parties' display names
    pub async fn game_history(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<GameTransactionView>, RepositoryError> {
        let entries = sqlx::query_as::<_, GameTransactionView>(
            r#"
            SELECT t.id, t.game_id,
                   t.from_user_id, fu.username AS from_username,
                   t.to_user_id, tu.username AS to_username,
                   t.amount, t.type, t.description, t.created_at
            FROM transactions t
            LEFT JOIN users fu ON fu.id = t.from_user_id
            LEFT JOIN users tu ON tu.id = t.to_user_id
            WHERE t.game_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Game history restricted to a time window
    pub async fn game_history_between(
        &self,
        game_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<GameTransactionView>, RepositoryError> {
        let entries = sqlx::query_as::<_, GameTransactionView>(
            r#"
            SELECT t.id, t.game_id,
                   t.from_user_id, fu.username AS from_username,
                   t.to_user_id, tu.username AS to_username,
                   t.amount, t.type, t.description, t.created_at
            FROM transactions t
            LEFT JOIN users fu ON fu.id = t.from_user_id
            LEFT JOIN users tu ON tu.id = t.to_user_id
            WHERE t.game_id = $1 AND t.created_at BETWEEN $2 AND $3
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(game_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// All ledger entries where the user is either party, newest first
    pub async fn user_transactions_in_game(
        &self,
        game_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let entries = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, game_id, from_user_id, to_user_id, amount, type, description, created_at
            FROM transactions
            WHERE game_id = $1 AND (from_user_id = $2 OR to_user_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

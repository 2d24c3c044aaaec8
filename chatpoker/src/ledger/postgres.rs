//! PostgreSQL ledger backed by the `wallets` and `wallet_entries` tables.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::{
    Ledger,
    errors::{LedgerError, LedgerResult},
    models::{LedgerEntry, LedgerTransfer},
};
use crate::game::PlayerId;

#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
    default_balance: i64,
}

impl PgLedger {
    /// Create a ledger over `pool`. Wallets are opened on first use with
    /// `default_balance` chips.
    pub fn new(pool: PgPool, default_balance: i64) -> Self {
        Self {
            pool,
            default_balance,
        }
    }

    async fn ensure_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        player_id: PlayerId,
    ) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO wallets (player_id, balance)
             VALUES ($1, $2)
             ON CONFLICT (player_id) DO NOTHING",
        )
        .bind(player_id)
        .bind(self.default_balance)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Balance recorded for an idempotency key that was already applied.
    async fn replayed(
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
    ) -> LedgerResult<Option<i64>> {
        let row = sqlx::query("SELECT balance_after FROM wallet_entries WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.map(|row| row.get("balance_after")))
    }

    async fn record_entry(
        tx: &mut Transaction<'_, Postgres>,
        transfer: &LedgerTransfer,
        amount: i64,
        balance_after: i64,
        key: &str,
    ) -> LedgerResult<()> {
        sqlx::query(
            "INSERT INTO wallet_entries
                (player_id, session_id, hand_no, amount, balance_after, reason, idempotency_key)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(transfer.player_id)
        .bind(transfer.session_id)
        .bind(i64::from(transfer.hand_no))
        .bind(amount)
        .bind(balance_after)
        .bind(transfer.reason.to_string())
        .bind(key)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Latest entries for a player, newest first.
    pub async fn entries(&self, player_id: PlayerId, limit: i64) -> LedgerResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            "SELECT id, player_id, session_id, amount, balance_after, reason, idempotency_key, created_at
             FROM wallet_entries
             WHERE player_id = $1
             ORDER BY id DESC
             LIMIT $2",
        )
        .bind(player_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> LedgerResult<LedgerEntry> {
                let reason: String = row.get("reason");
                Ok(LedgerEntry {
                    id: row.get("id"),
                    player_id: row.get("player_id"),
                    session_id: row.get("session_id"),
                    amount: row.get("amount"),
                    balance_after: row.get("balance_after"),
                    reason: reason
                        .parse()
                        .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
                    idempotency_key: row.get("idempotency_key"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn debit(&self, transfer: &LedgerTransfer) -> LedgerResult<i64> {
        if transfer.amount == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }
        let amount = i64::from(transfer.amount);
        let key = transfer.idempotency_key();

        let mut tx = self.pool.begin().await?;
        if let Some(balance) = Self::replayed(&mut tx, &key).await? {
            return Ok(balance);
        }
        self.ensure_wallet(&mut tx, transfer.player_id).await?;

        // Check and debit in one statement so concurrent buy-ins can't overdraw.
        let debited = sqlx::query(
            "UPDATE wallets
             SET balance = balance - $1, updated_at = NOW()
             WHERE player_id = $2 AND balance >= $1
             RETURNING balance",
        )
        .bind(amount)
        .bind(transfer.player_id)
        .fetch_optional(&mut *tx)
        .await?;

        let new_balance: i64 = match debited {
            Some(row) => row.get("balance"),
            None => {
                let row = sqlx::query("SELECT balance FROM wallets WHERE player_id = $1")
                    .bind(transfer.player_id)
                    .fetch_one(&mut *tx)
                    .await?;
                return Err(LedgerError::InsufficientFunds {
                    player_id: transfer.player_id,
                    available: row.get("balance"),
                    required: amount,
                });
            }
        };

        Self::record_entry(&mut tx, transfer, -amount, new_balance, &key).await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    async fn credit(&self, transfer: &LedgerTransfer) -> LedgerResult<i64> {
        if transfer.amount == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }
        let amount = i64::from(transfer.amount);
        let key = transfer.idempotency_key();

        let mut tx = self.pool.begin().await?;
        if let Some(balance) = Self::replayed(&mut tx, &key).await? {
            return Ok(balance);
        }
        self.ensure_wallet(&mut tx, transfer.player_id).await?;

        let row = sqlx::query("SELECT balance FROM wallets WHERE player_id = $1 FOR UPDATE")
            .bind(transfer.player_id)
            .fetch_one(&mut *tx)
            .await?;
        let current: i64 = row.get("balance");
        let new_balance = current
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;

        sqlx::query(
            "UPDATE wallets
             SET balance = $1, updated_at = NOW()
             WHERE player_id = $2",
        )
        .bind(new_balance)
        .bind(transfer.player_id)
        .execute(&mut *tx)
        .await?;

        Self::record_entry(&mut tx, transfer, amount, new_balance, &key).await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    async fn balance(&self, player_id: PlayerId) -> LedgerResult<i64> {
        let mut tx = self.pool.begin().await?;
        self.ensure_wallet(&mut tx, player_id).await?;
        let row = sqlx::query("SELECT balance FROM wallets WHERE player_id = $1")
            .bind(player_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row.get("balance"))
    }
}

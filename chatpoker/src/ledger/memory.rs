//! In-memory ledger for tests and the console demo.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{
    Ledger,
    errors::{LedgerError, LedgerResult},
    models::{LedgerEntry, LedgerTransfer},
};
use crate::game::PlayerId;

#[derive(Debug, Default)]
struct Books {
    balances: HashMap<PlayerId, i64>,
    entries: Vec<LedgerEntry>,
    /// Idempotency key to the balance it produced.
    applied: HashMap<String, i64>,
}

/// Ledger kept in process memory. New wallets start at `default_balance`.
#[derive(Debug)]
pub struct InMemoryLedger {
    default_balance: i64,
    books: Mutex<Books>,
}

impl InMemoryLedger {
    pub fn new(default_balance: i64) -> Self {
        Self {
            default_balance,
            books: Mutex::new(Books::default()),
        }
    }

    /// Overwrite a wallet balance.
    pub async fn set_balance(&self, player_id: PlayerId, balance: i64) {
        self.books.lock().await.balances.insert(player_id, balance);
    }

    /// All applied entries, oldest first.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.books.lock().await.entries.clone()
    }

    async fn apply(&self, transfer: &LedgerTransfer, signed: i64) -> LedgerResult<i64> {
        if transfer.amount == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }
        let key = transfer.idempotency_key();
        let mut books = self.books.lock().await;
        if let Some(&balance) = books.applied.get(&key) {
            log::debug!("Ledger replay of {key} ignored");
            return Ok(balance);
        }

        let current = *books
            .balances
            .entry(transfer.player_id)
            .or_insert(self.default_balance);
        let new_balance = current
            .checked_add(signed)
            .ok_or(LedgerError::BalanceOverflow)?;
        if new_balance < 0 {
            return Err(LedgerError::InsufficientFunds {
                player_id: transfer.player_id,
                available: current,
                required: -signed,
            });
        }

        books.balances.insert(transfer.player_id, new_balance);
        let id = books.entries.len() as i64 + 1;
        books.entries.push(LedgerEntry {
            id,
            player_id: transfer.player_id,
            session_id: transfer.session_id,
            amount: signed,
            balance_after: new_balance,
            reason: transfer.reason,
            idempotency_key: key.clone(),
            created_at: Utc::now(),
        });
        books.applied.insert(key, new_balance);
        Ok(new_balance)
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn debit(&self, transfer: &LedgerTransfer) -> LedgerResult<i64> {
        self.apply(transfer, -i64::from(transfer.amount)).await
    }

    async fn credit(&self, transfer: &LedgerTransfer) -> LedgerResult<i64> {
        self.apply(transfer, i64::from(transfer.amount)).await
    }

    async fn balance(&self, player_id: PlayerId) -> LedgerResult<i64> {
        let mut books = self.books.lock().await;
        Ok(*books
            .balances
            .entry(player_id)
            .or_insert(self.default_balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransferReason;

    fn transfer(player_id: PlayerId, amount: u32, reason: TransferReason) -> LedgerTransfer {
        LedgerTransfer {
            player_id,
            amount,
            reason,
            session_id: 1,
            instance: 0,
            hand_no: 1,
            ticket: 0,
        }
    }

    #[tokio::test]
    async fn test_new_wallet_gets_default_balance() {
        let ledger = InMemoryLedger::new(500);
        assert_eq!(ledger.balance(9).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_debit_and_credit() {
        let ledger = InMemoryLedger::new(1000);
        assert_eq!(
            ledger.debit(&transfer(1, 300, TransferReason::BuyIn)).await.unwrap(),
            700
        );
        assert_eq!(
            ledger.credit(&transfer(1, 450, TransferReason::GameWin)).await.unwrap(),
            1150
        );
        let entries = ledger.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].amount, -300);
        assert_eq!(entries[1].balance_after, 1150);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_balance() {
        let ledger = InMemoryLedger::new(100);
        let err = ledger
            .debit(&transfer(1, 300, TransferReason::BuyIn))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                available: 100,
                required: 300,
                ..
            }
        ));
        assert_eq!(ledger.balance(1).await.unwrap(), 100);
        assert!(ledger.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_replay_is_noop() {
        let ledger = InMemoryLedger::new(0);
        let win = transfer(1, 250, TransferReason::GameWin);
        assert_eq!(ledger.credit(&win).await.unwrap(), 250);
        assert_eq!(ledger.credit(&win).await.unwrap(), 250);
        assert_eq!(ledger.balance(1).await.unwrap(), 250);
        assert_eq!(ledger.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let ledger = InMemoryLedger::new(0);
        let err = ledger
            .credit(&transfer(1, 0, TransferReason::Refund))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(0)));
    }
}

//! Ledger error types.

use std::time::Duration;
use thiserror::Error;

use crate::game::PlayerId;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Insufficient funds for player {player_id}: available {available}, required {required}")]
    InsufficientFunds {
        player_id: PlayerId,
        available: i64,
        required: i64,
    },

    /// Transfers must move at least one chip.
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Ledger call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Balance overflow")]
    BalanceOverflow,
}

impl LedgerError {
    /// A message safe to show in chat. Database details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            LedgerError::Database(_) => "Internal ledger error".to_string(),
            LedgerError::InsufficientFunds {
                available,
                required,
                ..
            } => format!("Not enough coins: have {available}, need {required}"),
            _ => self.to_string(),
        }
    }

    /// Whether retrying the same transfer may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Database(_) | LedgerError::Timeout(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

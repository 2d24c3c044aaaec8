//! Ledger data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::{Chips, PlayerId, SessionId};

/// Account that collects rake.
pub const HOUSE_ACCOUNT: PlayerId = 0;

/// Why chips moved between a wallet and a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferReason {
    BuyIn,
    GameWin,
    Refund,
    CashOut,
    Rake,
}

impl fmt::Display for TransferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferReason::BuyIn => write!(f, "buy_in"),
            TransferReason::GameWin => write!(f, "game_win"),
            TransferReason::Refund => write!(f, "refund"),
            TransferReason::CashOut => write!(f, "cash_out"),
            TransferReason::Rake => write!(f, "rake"),
        }
    }
}

impl std::str::FromStr for TransferReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy_in" => Ok(TransferReason::BuyIn),
            "game_win" => Ok(TransferReason::GameWin),
            "refund" => Ok(TransferReason::Refund),
            "cash_out" => Ok(TransferReason::CashOut),
            "rake" => Ok(TransferReason::Rake),
            other => Err(format!("unknown transfer reason: {other}")),
        }
    }
}

/// A single debit or credit requested by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransfer {
    pub player_id: PlayerId,
    pub amount: Chips,
    pub reason: TransferReason,
    pub session_id: SessionId,
    /// Random per session actor. Chat ids get reused for later games, and
    /// this keeps their keys apart.
    pub instance: u64,
    pub hand_no: u32,
    /// The seat's join ticket, so a player who rejoins a session gets
    /// distinct keys for the second buy-in.
    pub ticket: u32,
}

impl LedgerTransfer {
    /// Key under which the ledger deduplicates this transfer. Replaying a
    /// transfer with the same key is a successful no-op.
    pub fn idempotency_key(&self) -> String {
        format!(
            "{}:{:016x}:{}:{}:{}:{}",
            self.session_id, self.instance, self.hand_no, self.reason, self.player_id, self.ticket
        )
    }
}

/// Ledger entry, one row per applied transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub player_id: PlayerId,
    pub session_id: SessionId,
    /// Signed: negative for debits.
    pub amount: i64,
    pub balance_after: i64,
    pub reason: TransferReason,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_key_format() {
        let transfer = LedgerTransfer {
            player_id: 42,
            amount: 100,
            reason: TransferReason::GameWin,
            session_id: 7,
            instance: 0xbeef,
            hand_no: 3,
            ticket: 1,
        };
        assert_eq!(transfer.idempotency_key(), "7:000000000000beef:3:game_win:42:1");
    }

    #[test]
    fn test_reason_round_trips_through_text() {
        for reason in [
            TransferReason::BuyIn,
            TransferReason::GameWin,
            TransferReason::Refund,
            TransferReason::CashOut,
            TransferReason::Rake,
        ] {
            assert_eq!(reason.to_string().parse::<TransferReason>(), Ok(reason));
        }
        assert!("jackpot".parse::<TransferReason>().is_err());
    }
}

//! Ledger boundary: where session chips come from and go back to.
//!
//! Sessions never hold coins of their own. A buy-in debits the player's
//! wallet, and every payout, refund or cash-out credits it. All transfers
//! carry an idempotency key so a retried credit is applied at most once.
//!
//! ## Example
//!
//! ```
//! use chatpoker::ledger::{InMemoryLedger, Ledger, LedgerTransfer, TransferReason};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = InMemoryLedger::new(1_000);
//! let buy_in = LedgerTransfer {
//!     player_id: 1,
//!     amount: 200,
//!     reason: TransferReason::BuyIn,
//!     session_id: 1,
//!     instance: 0,
//!     hand_no: 1,
//!     ticket: 0,
//! };
//! assert_eq!(ledger.debit(&buy_in).await?, 800);
//! // Replays are no-ops.
//! assert_eq!(ledger.debit(&buy_in).await?, 800);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

pub mod errors;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod timeouts;

pub use errors::{LedgerError, LedgerResult};
pub use memory::InMemoryLedger;
pub use models::{HOUSE_ACCOUNT, LedgerEntry, LedgerTransfer, TransferReason};
pub use postgres::PgLedger;
pub use timeouts::{DEFAULT_LEDGER_TIMEOUT, with_timeout};

use crate::game::PlayerId;

/// Wallet storage used by session actors.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Take chips out of the player's wallet. Returns the new balance.
    ///
    /// # Errors
    ///
    /// * `LedgerError::InsufficientFunds` - The wallet can't cover the amount
    /// * `LedgerError::InvalidAmount` - Zero amount
    async fn debit(&self, transfer: &LedgerTransfer) -> LedgerResult<i64>;

    /// Put chips into the player's wallet. Returns the new balance.
    async fn credit(&self, transfer: &LedgerTransfer) -> LedgerResult<i64>;

    /// Current wallet balance. Unknown players get a fresh wallet.
    async fn balance(&self, player_id: PlayerId) -> LedgerResult<i64>;
}

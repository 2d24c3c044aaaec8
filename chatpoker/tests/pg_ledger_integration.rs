//! PostgreSQL ledger tests. Need a database:
//!
//! ```sh
//! DATABASE_URL=postgres://postgres@localhost/chatpoker_test cargo test -- --ignored
//! ```

use chatpoker::{
    db::{Database, DatabaseConfig},
    ledger::{Ledger, LedgerError, LedgerTransfer, PgLedger, TransferReason},
};

async fn setup() -> PgLedger {
    let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
    let db = Database::new(&config).await.expect("connect");
    db.migrate().await.expect("migrate");
    PgLedger::new(db.pool().clone(), 1_000)
}

/// Player ids that won't collide with earlier runs against the same database.
fn fresh_player_id() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

fn transfer(player_id: i64, amount: u32, reason: TransferReason) -> LedgerTransfer {
    LedgerTransfer {
        player_id,
        amount,
        reason,
        session_id: 99,
        instance: 0,
        hand_no: 1,
        ticket: 0,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_debit_credit_and_replay() {
    let ledger = setup().await;
    let player_id = fresh_player_id();

    assert_eq!(ledger.balance(player_id).await.unwrap(), 1_000);

    let buy_in = transfer(player_id, 400, TransferReason::BuyIn);
    assert_eq!(ledger.debit(&buy_in).await.unwrap(), 600);
    assert_eq!(ledger.debit(&buy_in).await.unwrap(), 600);

    let win = transfer(player_id, 900, TransferReason::GameWin);
    assert_eq!(ledger.credit(&win).await.unwrap(), 1_500);
    assert_eq!(ledger.credit(&win).await.unwrap(), 1_500);

    let entries = ledger.entries(player_id, 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].reason, TransferReason::GameWin);
    assert_eq!(entries[1].amount, -400);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_debit_never_overdraws() {
    let ledger = setup().await;
    let player_id = fresh_player_id();

    let result = ledger
        .debit(&transfer(player_id, 1_001, TransferReason::BuyIn))
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientFunds {
            available: 1_000,
            required: 1_001,
            ..
        })
    ));
    assert_eq!(ledger.balance(player_id).await.unwrap(), 1_000);
}

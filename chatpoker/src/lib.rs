//! # chatpoker
//!
//! A multiplayer Texas Hold'em engine meant to sit behind a chat bot.
//!
//! The crate is split into three layers:
//!
//! - [`game`]: the pure session state machine. Seating, blinds, betting
//!   validation, street progression, hand evaluation, side pots and turn
//!   timeouts. No I/O.
//! - [`table`]: one Tokio actor per session, a registry that routes chat
//!   intents to the right actor, and the sweeper that drives timeouts.
//! - [`ledger`]: where chips come from and go back to. Buy-ins debit a
//!   wallet; payouts, refunds and cash-outs credit it, each exactly once.
//!
//! ## Example
//!
//! ```
//! use chatpoker::game::{Action, GameSettings, Phase, Session};
//!
//! let mut session = Session::new(1, GameSettings::default());
//! session.add_seat(1, "alice", 1_000).unwrap();
//! session.add_seat(2, "bob", 1_000).unwrap();
//! session.start(chrono::Utc::now()).unwrap();
//!
//! // Heads-up, the small blind acts first.
//! session.act(2, Action::Fold, chrono::Utc::now()).unwrap();
//! assert_eq!(session.phase(), Phase::Finished);
//! assert_eq!(session.outcome().unwrap().paid_to(1), 30);
//! ```

/// Core game logic, entities, and the session state machine.
pub mod game;

/// Wallet boundary: trait, in-memory and PostgreSQL implementations.
pub mod ledger;

/// PostgreSQL connection pooling for [`ledger::PgLedger`].
pub mod db;

/// Session actors, registry and timeout sweeper.
pub mod table;

pub use game::{
    Action, ActionError, Card, GameSettings, Phase, Session, SessionError, SessionView,
    constants, entities, functional,
};
pub use ledger::{InMemoryLedger, Ledger, LedgerError, PgLedger};
pub use table::{SessionConfig, SessionHandle, SessionRegistry, TableError, TimeoutSweeper};

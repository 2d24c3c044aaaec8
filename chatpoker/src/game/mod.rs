//! Hold'em engine: cards, seats, the session state machine and hand
//! evaluation.
//!
//! Nothing in here does I/O. A [`Session`] is driven by whoever owns it
//! (normally a session actor) and reports everything it decided through
//! its return values and [`SessionView`] snapshots.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod functional;
pub mod session;

pub use entities::{
    Action, Card, Chips, Deck, HandValue, Outcome, Payout, Phase, PlayerId, Rank, Seat,
    SeatIndex, SeatView, SessionId, SessionView, Suit,
};
pub use errors::{ActionError, SessionError};
pub use session::{ForcedAction, GameSettings, RemovedSeat, Session};

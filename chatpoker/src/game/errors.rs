//! Session error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, Phase};

/// An illegal action for the current state. Always recoverable: the
/// session is left exactly as it was.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ActionError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("can't check while facing a bet")]
    IllegalCheck,
    #[error("nothing to call")]
    IllegalCall,
    #[error("raise must be to between {min} and {max}")]
    IllegalRaiseAmount { min: Chips, max: Chips },
    #[error("seat has folded or is all-in")]
    SeatInactive,
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("player isn't seated")]
    UnknownPlayer,
}

/// Lifecycle and resource errors raised by a session.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SessionError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("session isn't accepting seats during {0}")]
    NotWaiting(Phase),
    #[error("session is full")]
    SessionFull,
    #[error("player already seated")]
    AlreadySeated,
    #[error("player isn't seated")]
    NotSeated,
    #[error("need {required}+ players")]
    NotEnoughPlayers { required: usize },
    #[error("buy-in must be between {min} and {max}")]
    InvalidBuyIn { min: Chips, max: Chips },
    #[error("session already finished")]
    AlreadyFinished,
    #[error("hand is still in progress")]
    HandInProgress,
    #[error("deck exhausted: requested {requested}, {remaining} left")]
    DeckExhausted { requested: usize, remaining: usize },
}

impl SessionError {
    /// Internal invariant violations that end the hand with a refund.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DeckExhausted { .. })
    }
}

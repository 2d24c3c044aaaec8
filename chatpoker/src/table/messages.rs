//! Session actor message types.

use tokio::sync::{mpsc, oneshot};

use super::errors::TableResult;
use crate::game::{Action, Chips, Outcome, PlayerId, SessionId, SessionView};

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
    /// Take a seat, debiting `buy_in` from the player's wallet
    Join {
        player_id: PlayerId,
        name: String,
        buy_in: Chips,
        response: oneshot::Sender<TableResult<SessionView>>,
    },

    /// Give up a seat before the hand starts, refunding the stack
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<TableResult<SessionView>>,
    },

    Start {
        response: oneshot::Sender<TableResult<SessionView>>,
    },

    /// Player action (fold, check, call, raise, all-in)
    Act {
        player_id: PlayerId,
        action: Action,
        response: oneshot::Sender<TableResult<SessionView>>,
    },

    /// Snapshot for `viewer`, or a public one
    GetView {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<SessionView>,
    },

    /// Cancel the hand and refund everyone
    Abort {
        response: oneshot::Sender<TableResult<SessionView>>,
    },

    /// Timeout check, sent by the sweeper
    Tick,

    Subscribe {
        player_id: PlayerId,
        sender: mpsc::Sender<SessionEvent>,
    },

    Unsubscribe { player_id: PlayerId },
}

/// Pushed to subscribers after every change
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// New state, rendered for the subscriber
    StateChanged(Box<SessionView>),

    /// A stalled seat was acted for
    TimedOut {
        player_id: PlayerId,
        action: Action,
        strikes: u8,
    },

    HandFinished {
        hand_no: u32,
        outcome: Outcome,
    },

    /// The actor stopped; the session id is now stale
    Closed(SessionId),
}

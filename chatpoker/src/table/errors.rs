//! Errors surfaced at the actor and registry boundary.

use thiserror::Error;

use crate::{
    game::{SessionError, SessionId},
    ledger::LedgerError,
};

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The session id doesn't name a live session, usually because the
    /// session already finished.
    #[error("Session {0} is no longer running")]
    StaleSession(SessionId),

    #[error("Session {0} already exists")]
    SessionExists(SessionId),

    #[error("Invalid session config: {0}")]
    InvalidConfig(String),
}

impl TableError {
    /// A message safe to show in chat.
    pub fn client_message(&self) -> String {
        match self {
            TableError::Ledger(e) => e.client_message(),
            TableError::StaleSession(_) => "That game is over".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type TableResult<T> = Result<T, TableError>;

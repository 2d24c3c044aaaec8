//! Registry for spawning and routing to session actors.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

use super::{
    actor::{SessionActor, SessionHandle},
    config::SessionConfig,
    errors::{TableError, TableResult},
    messages::SessionEvent,
};
use crate::{
    game::{Action, Card, Chips, PlayerId, SessionId, SessionView},
    ledger::{DEFAULT_LEDGER_TIMEOUT, Ledger, with_timeout},
};

/// Subscriber channel size used by [`SessionRegistry::subscribe`].
const SUBSCRIBER_CAPACITY: usize = 32;

/// Maps session ids to running actors. Cloning shares the same registry.
#[derive(Clone)]
pub struct SessionRegistry {
    ledger: Arc<dyn Ledger>,

    /// Handles of spawned sessions, including ones that have since stopped
    /// until [`SessionRegistry::prune`] removes them
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,

    /// Next id handed out by [`SessionRegistry::open_session`]
    next_session_id: Arc<RwLock<SessionId>>,
}

impl SessionRegistry {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_session_id: Arc::new(RwLock::new(1)),
        }
    }

    pub fn ledger(&self) -> Arc<dyn Ledger> {
        self.ledger.clone()
    }

    /// Spawn a session under the next free id.
    pub async fn open_session(&self, config: SessionConfig) -> TableResult<SessionHandle> {
        self.spawn(None, config, None).await
    }

    /// Spawn a session whose first hand is dealt from `cards` in order.
    pub async fn open_session_with_deck(
        &self,
        config: SessionConfig,
        cards: Vec<Card>,
    ) -> TableResult<SessionHandle> {
        self.spawn(None, config, Some(cards)).await
    }

    /// Spawn a session under a caller-chosen id, such as a chat id. A
    /// stopped session with the same id is replaced.
    ///
    /// # Errors
    ///
    /// * `TableError::SessionExists` - A live session already uses the id
    /// * `TableError::InvalidConfig` - The config failed validation
    pub async fn create_session(
        &self,
        session_id: SessionId,
        config: SessionConfig,
    ) -> TableResult<SessionHandle> {
        self.spawn(Some(session_id), config, None).await
    }

    async fn spawn(
        &self,
        session_id: Option<SessionId>,
        config: SessionConfig,
        deck: Option<Vec<Card>>,
    ) -> TableResult<SessionHandle> {
        config.validate().map_err(TableError::InvalidConfig)?;

        let mut sessions = self.sessions.write().await;
        let session_id = match session_id {
            Some(id) => {
                if sessions.get(&id).is_some_and(|handle| !handle.is_closed()) {
                    return Err(TableError::SessionExists(id));
                }
                id
            }
            None => {
                let mut next_id = self.next_session_id.write().await;
                while sessions.contains_key(&*next_id) {
                    *next_id += 1;
                }
                let id = *next_id;
                *next_id += 1;
                id
            }
        };

        let name = config.name.clone();
        let (mut actor, handle) = SessionActor::new(session_id, config, self.ledger.clone());
        if let Some(cards) = deck {
            actor = actor.with_deck(cards);
        }
        sessions.insert(session_id, handle.clone());
        drop(sessions);

        tokio::spawn(actor.run());

        log::info!("Created session {} '{}'", session_id, name);
        Ok(handle)
    }

    /// Handle of a running session.
    ///
    /// # Errors
    ///
    /// * `TableError::StaleSession` - Unknown id, or the session has stopped
    pub async fn get(&self, session_id: SessionId) -> TableResult<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
            .ok_or(TableError::StaleSession(session_id))
    }

    pub async fn join(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        name: &str,
        buy_in: Chips,
    ) -> TableResult<SessionView> {
        self.get(session_id).await?.join(player_id, name, buy_in).await
    }

    pub async fn leave(&self, session_id: SessionId, player_id: PlayerId) -> TableResult<SessionView> {
        self.get(session_id).await?.leave(player_id).await
    }

    pub async fn start(&self, session_id: SessionId) -> TableResult<SessionView> {
        self.get(session_id).await?.start().await
    }

    pub async fn act(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
        action: Action,
    ) -> TableResult<SessionView> {
        self.get(session_id).await?.act(player_id, action).await
    }

    pub async fn view(
        &self,
        session_id: SessionId,
        viewer: Option<PlayerId>,
    ) -> TableResult<SessionView> {
        self.get(session_id).await?.view(viewer).await
    }

    pub async fn abort(&self, session_id: SessionId) -> TableResult<SessionView> {
        self.get(session_id).await?.abort().await
    }

    pub async fn subscribe(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> TableResult<mpsc::Receiver<SessionEvent>> {
        self.get(session_id)
            .await?
            .subscribe(player_id, SUBSCRIBER_CAPACITY)
            .await
    }

    /// Wallet balance, bounded like every other ledger call.
    pub async fn balance(&self, player_id: PlayerId) -> TableResult<i64> {
        Ok(with_timeout(DEFAULT_LEDGER_TIMEOUT, self.ledger.balance(player_id)).await?)
    }

    /// Snapshot of every registered handle, live or not.
    pub async fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Ids of the sessions still running, ascending.
    pub async fn list_sessions(&self) -> Vec<SessionId> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, handle)| !handle.is_closed())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Forget stopped sessions. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| !handle.is_closed());
        let removed = before - sessions.len();
        if removed > 0 {
            log::debug!("Pruned {} stopped sessions", removed);
        }
        removed
    }

    pub async fn active_session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|handle| !handle.is_closed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(InMemoryLedger::new(10_000)))
    }

    #[tokio::test]
    async fn test_open_session_assigns_fresh_ids() {
        let registry = registry();
        registry.create_session(2, SessionConfig::default()).await.unwrap();

        let first = registry.open_session(SessionConfig::default()).await.unwrap();
        let second = registry.open_session(SessionConfig::default()).await.unwrap();
        assert_eq!(first.session_id(), 1);
        // 2 is taken by the chat-keyed session.
        assert_eq!(second.session_id(), 3);
        assert_eq!(registry.list_sessions().await, vec![1, 2, 3]);
        assert_eq!(registry.active_session_count().await, 3);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let registry = registry();
        let mut config = SessionConfig::default();
        config.settings.big_blind = 0;

        let result = registry.open_session(config).await;
        assert!(matches!(result, Err(TableError::InvalidConfig(_))));
        assert_eq!(registry.active_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_is_stale() {
        let registry = registry();
        let result = registry.start(42).await;
        assert!(matches!(result, Err(TableError::StaleSession(42))));
    }
}

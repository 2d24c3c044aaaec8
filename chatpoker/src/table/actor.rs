//! Session actor implementation with async message handling.

use chrono::Utc;
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::{mpsc, oneshot};

use super::{
    config::SessionConfig,
    errors::{TableError, TableResult},
    messages::{SessionEvent, SessionMessage},
};
use crate::{
    game::{Action, Card, Chips, Phase, PlayerId, Session, SessionId, SessionView},
    ledger::{
        HOUSE_ACCOUNT, Ledger, LedgerResult, LedgerTransfer, TransferReason, with_timeout,
    },
};

/// Attempts per ledger call when the failure looks transient.
const LEDGER_ATTEMPTS: usize = 3;

#[derive(Clone, Copy, Debug)]
enum LedgerOp {
    Debit,
    Credit,
}

impl fmt::Display for LedgerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerOp::Debit => write!(f, "debit"),
            LedgerOp::Credit => write!(f, "credit"),
        }
    }
}

/// Session actor handle for sending messages
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    session_id: SessionId,
}

impl SessionHandle {
    pub fn new(sender: mpsc::Sender<SessionMessage>, session_id: SessionId) -> Self {
        Self { sender, session_id }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Wait until the actor stops.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    /// Send a message to the session
    pub async fn send(&self, message: SessionMessage) -> TableResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::StaleSession(self.session_id))
    }

    /// Queue a timeout check without waiting for inbox space. A full inbox
    /// skips this tick. Returns false once the actor has stopped.
    pub fn try_tick(&self) -> bool {
        match self.sender.try_send(SessionMessage::Tick) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::debug!("Session {} inbox full, skipping tick", self.session_id);
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> TableResult<T> {
        let (response, reply) = oneshot::channel();
        self.send(build(response)).await?;
        reply
            .await
            .map_err(|_| TableError::StaleSession(self.session_id))
    }

    pub async fn join(
        &self,
        player_id: PlayerId,
        name: &str,
        buy_in: Chips,
    ) -> TableResult<SessionView> {
        let name = name.to_string();
        self.request(|response| SessionMessage::Join {
            player_id,
            name,
            buy_in,
            response,
        })
        .await?
    }

    pub async fn leave(&self, player_id: PlayerId) -> TableResult<SessionView> {
        self.request(|response| SessionMessage::Leave {
            player_id,
            response,
        })
        .await?
    }

    pub async fn start(&self) -> TableResult<SessionView> {
        self.request(|response| SessionMessage::Start { response })
            .await?
    }

    pub async fn act(&self, player_id: PlayerId, action: Action) -> TableResult<SessionView> {
        self.request(|response| SessionMessage::Act {
            player_id,
            action,
            response,
        })
        .await?
    }

    pub async fn view(&self, viewer: Option<PlayerId>) -> TableResult<SessionView> {
        self.request(|response| SessionMessage::GetView { viewer, response })
            .await
    }

    pub async fn abort(&self) -> TableResult<SessionView> {
        self.request(|response| SessionMessage::Abort { response })
            .await?
    }

    /// Receive a [`SessionEvent`] after every change, rendered for
    /// `player_id`. The current state is sent right away.
    pub async fn subscribe(
        &self,
        player_id: PlayerId,
        capacity: usize,
    ) -> TableResult<mpsc::Receiver<SessionEvent>> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        self.send(SessionMessage::Subscribe { player_id, sender })
            .await?;
        Ok(receiver)
    }

    pub async fn unsubscribe(&self, player_id: PlayerId) -> TableResult<()> {
        self.send(SessionMessage::Unsubscribe { player_id }).await
    }
}

/// Actor owning a single poker session
pub struct SessionActor {
    id: SessionId,

    /// Mixed into ledger keys so a reused session id never replays an
    /// earlier game's transfers
    instance: u64,

    config: SessionConfig,

    /// The only copy of the session state
    session: Session,

    inbox: mpsc::Receiver<SessionMessage>,

    /// Wallet storage for buy-ins, payouts and refunds
    ledger: Arc<dyn Ledger>,

    subscribers: HashMap<PlayerId, mpsc::Sender<SessionEvent>>,

    is_closed: bool,
}

impl SessionActor {
    /// Create an actor and the handle that feeds it. Nothing runs until
    /// [`SessionActor::run`] is spawned.
    pub fn new(
        id: SessionId,
        config: SessionConfig,
        ledger: Arc<dyn Ledger>,
    ) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let session = Session::new(id, config.settings.clone());

        let actor = Self {
            id,
            instance: rand::random(),
            config,
            session,
            inbox,
            ledger,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        (actor, SessionHandle::new(sender, id))
    }

    /// Deal the first hand from `cards` in order instead of shuffling.
    #[must_use]
    pub fn with_deck(mut self, cards: Vec<Card>) -> Self {
        self.session.stack_deck(cards);
        self
    }

    /// Run the session actor event loop
    pub async fn run(mut self) {
        log::info!("Session {} '{}' open", self.id, self.config.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;
            if self.is_closed {
                break;
            }
        }

        // Every handle was dropped mid-session; nobody can finish the hand.
        if !self.is_closed && !self.session.seats().is_empty() {
            log::warn!(
                "Session {} abandoned with {} seats, refunding",
                self.id,
                self.session.seats().len()
            );
            if let Err(e) = self.abort_hand().await {
                log::error!("Session {}: failed to abort abandoned hand: {}", self.id, e);
            }
        }

        log::info!("Session {} '{}' closed", self.id, self.config.name);
    }

    async fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join {
                player_id,
                name,
                buy_in,
                response,
            } => {
                let result = self.handle_join(player_id, &name, buy_in).await;
                let _ = response.send(result);
            }

            SessionMessage::Leave {
                player_id,
                response,
            } => {
                let result = self.handle_leave(player_id).await;
                let _ = response.send(result);
            }

            SessionMessage::Start { response } => {
                let result = self.handle_start().await;
                let _ = response.send(result);
            }

            SessionMessage::Act {
                player_id,
                action,
                response,
            } => {
                let result = self.handle_action(player_id, action).await;
                let _ = response.send(result);
            }

            SessionMessage::GetView { viewer, response } => {
                let _ = response.send(self.session.view(viewer));
            }

            SessionMessage::Abort { response } => {
                let result = self
                    .abort_hand()
                    .await
                    .map(|()| self.session.view(None));
                let _ = response.send(result);
            }

            SessionMessage::Tick => {
                self.handle_tick().await;
            }

            SessionMessage::Subscribe { player_id, sender } => {
                let view = Box::new(self.session.view(Some(player_id)));
                if sender.try_send(SessionEvent::StateChanged(view)).is_ok() {
                    self.subscribers.insert(player_id, sender);
                    log::debug!("Player {} subscribed to session {}", player_id, self.id);
                }
            }

            SessionMessage::Unsubscribe { player_id } => {
                self.subscribers.remove(&player_id);
                log::debug!("Player {} unsubscribed from session {}", player_id, self.id);
            }
        }
    }

    /// Push a personalised view to every subscriber
    fn broadcast(&mut self) {
        let session = &self.session;
        self.subscribers.retain(|player_id, sender| {
            let view = Box::new(session.view(Some(*player_id)));
            keep_subscriber(*player_id, sender.try_send(SessionEvent::StateChanged(view)))
        });
    }

    fn notify(&mut self, event: SessionEvent) {
        self.subscribers.retain(|player_id, sender| {
            keep_subscriber(*player_id, sender.try_send(event.clone()))
        });
    }

    fn close(&mut self) {
        self.is_closed = true;
        self.notify(SessionEvent::Closed(self.id));
    }

    fn transfer(
        &self,
        player_id: PlayerId,
        ticket: u32,
        amount: Chips,
        reason: TransferReason,
    ) -> LedgerTransfer {
        LedgerTransfer {
            player_id,
            amount,
            reason,
            session_id: self.id,
            instance: self.instance,
            hand_no: self.session.hand_no(),
            ticket,
        }
    }

    /// Join tickets of the current seats, captured before seats go away.
    fn tickets(&self) -> HashMap<PlayerId, u32> {
        self.session
            .seats()
            .iter()
            .map(|s| (s.player_id, s.ticket))
            .collect()
    }

    /// One ledger call under the configured timeout, retried while the
    /// failure is transient. Safe because transfers are idempotent.
    async fn call_ledger(&self, op: LedgerOp, transfer: &LedgerTransfer) -> LedgerResult<i64> {
        let timeout = self.config.ledger_timeout();
        let mut attempt = 1;
        loop {
            let result = match op {
                LedgerOp::Debit => with_timeout(timeout, self.ledger.debit(transfer)).await,
                LedgerOp::Credit => with_timeout(timeout, self.ledger.credit(transfer)).await,
            };
            match result {
                Err(e) if e.is_transient() && attempt < LEDGER_ATTEMPTS => {
                    log::warn!(
                        "Session {}: ledger {} {} failed (attempt {}): {}",
                        self.id,
                        op,
                        transfer.idempotency_key(),
                        attempt,
                        e
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Credit that must not fail the caller, such as a payout after the
    /// hand is already settled in memory.
    async fn credit_or_log(&self, transfer: LedgerTransfer) {
        if transfer.amount == 0 {
            return;
        }
        if let Err(e) = self.call_ledger(LedgerOp::Credit, &transfer).await {
            log::error!(
                "CRITICAL: Failed to credit {} chips to player {} ({}): {}. Chips are owed!",
                transfer.amount,
                transfer.player_id,
                transfer.idempotency_key(),
                e
            );
        }
    }

    async fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        buy_in: Chips,
    ) -> TableResult<SessionView> {
        let idx = self.session.add_seat(player_id, name, buy_in)?;
        let ticket = self.session.seats()[idx].ticket;
        let transfer = self.transfer(player_id, ticket, buy_in, TransferReason::BuyIn);

        if let Err(e) = self.call_ledger(LedgerOp::Debit, &transfer).await {
            if let Err(rollback_err) = self.session.remove_seat(player_id) {
                log::error!(
                    "CRITICAL: Failed to unseat player {} after failed buy-in on session {}: {}",
                    player_id,
                    self.id,
                    rollback_err
                );
            }
            if e.is_transient() {
                log::error!(
                    "CRITICAL: Buy-in {} may have been applied without a seat: {}",
                    transfer.idempotency_key(),
                    e
                );
            } else {
                log::info!(
                    "Player {} couldn't buy into session {}: {}",
                    player_id,
                    self.id,
                    e
                );
            }
            return Err(e.into());
        }

        log::info!(
            "Player {} ({}) joined session {} with {} chips",
            player_id,
            name,
            self.id,
            buy_in
        );
        self.broadcast();

        if self.config.auto_start
            && self.session.seats().len() >= self.config.settings.min_players
            && let Err(e) = self.start_hand().await
        {
            log::warn!("Session {}: auto-start failed: {}", self.id, e);
        }

        Ok(self.session.view(Some(player_id)))
    }

    async fn handle_leave(&mut self, player_id: PlayerId) -> TableResult<SessionView> {
        let removed = self.session.remove_seat(player_id)?;
        let (ticket, stack) = (removed.seat.ticket, removed.seat.stack);

        if stack > 0 {
            // Leaving before the first hand undoes the buy-in; later it's a cash-out.
            let reason = if self.session.hand_no() > 1 {
                TransferReason::CashOut
            } else {
                TransferReason::Refund
            };
            let transfer = self.transfer(player_id, ticket, stack, reason);
            if let Err(e) = self.call_ledger(LedgerOp::Credit, &transfer).await {
                log::warn!(
                    "Session {}: refund for player {} failed, keeping the seat: {}",
                    self.id,
                    player_id,
                    e
                );
                if let Err(reinstate_err) = self.session.reinstate_seat(removed) {
                    log::error!(
                        "CRITICAL: Failed to reseat player {} on session {}: {}. Chips may be lost!",
                        player_id,
                        self.id,
                        reinstate_err
                    );
                }
                return Err(e.into());
            }
        }

        log::info!(
            "Player {} left session {} with {} chips",
            player_id,
            self.id,
            stack
        );
        self.subscribers.remove(&player_id);
        self.broadcast();
        Ok(self.session.view(None))
    }

    async fn handle_start(&mut self) -> TableResult<SessionView> {
        self.start_hand().await?;
        Ok(self.session.view(None))
    }

    async fn start_hand(&mut self) -> TableResult<()> {
        self.session.start(Utc::now())?;
        self.after_mutation().await;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        player_id: PlayerId,
        action: Action,
    ) -> TableResult<SessionView> {
        if let Err(e) = self.session.act(player_id, action, Utc::now()) {
            if e.is_fatal() {
                log::error!("Session {}: {}, aborting hand", self.id, e);
                self.abort_hand().await?;
            }
            return Err(e.into());
        }

        self.after_mutation().await;
        Ok(self.session.view(Some(player_id)))
    }

    async fn handle_tick(&mut self) {
        let phase = self.session.phase();
        if phase == Phase::Waiting {
            // Continuous sessions deal the next hand on the first tick after
            // the previous one settled.
            if self.config.auto_start
                && self.session.hand_no() > 1
                && self.session.seats().len() >= self.config.settings.min_players
                && let Err(e) = self.start_hand().await
            {
                log::warn!("Session {}: couldn't deal next hand: {}", self.id, e);
            }
            return;
        }
        if !phase.is_betting() {
            return;
        }

        match self.session.check_timeout(Utc::now()) {
            Ok(Some(forced)) => {
                self.notify(SessionEvent::TimedOut {
                    player_id: forced.player_id,
                    action: forced.action,
                    strikes: forced.strikes,
                });
                self.after_mutation().await;
            }
            Ok(None) => {}
            Err(e) if e.is_fatal() => {
                log::error!("Session {}: {} during timeout, aborting hand", self.id, e);
                if let Err(abort_err) = self.abort_hand().await {
                    log::error!("Session {}: abort failed: {}", self.id, abort_err);
                }
            }
            Err(e) => log::warn!("Session {}: timeout check failed: {}", self.id, e),
        }
    }

    async fn after_mutation(&mut self) {
        self.broadcast();
        if self.session.phase() == Phase::Finished {
            self.settle().await;
        }
    }

    /// Pay out a finished hand. Single-hand sessions then cash everyone out
    /// and close; continuous sessions roll into the next hand.
    async fn settle(&mut self) {
        let Some(outcome) = self.session.outcome().cloned() else {
            return;
        };
        if outcome.aborted {
            return;
        }
        let hand_no = self.session.hand_no();
        self.notify(SessionEvent::HandFinished {
            hand_no,
            outcome: outcome.clone(),
        });
        if outcome.rake > 0 {
            let rake = self.transfer(HOUSE_ACCOUNT, 0, outcome.rake, TransferReason::Rake);
            self.credit_or_log(rake).await;
        }

        let tickets = self.tickets();
        if self.config.continuous {
            match self.session.next_hand() {
                Ok(busted) => {
                    for (player_id, amount) in busted {
                        let ticket = tickets.get(&player_id).copied().unwrap_or_default();
                        let mut cash_out =
                            self.transfer(player_id, ticket, amount, TransferReason::CashOut);
                        cash_out.hand_no = hand_no;
                        self.credit_or_log(cash_out).await;
                        log::info!(
                            "Player {} left session {} short of the big blind",
                            player_id,
                            self.id
                        );
                    }
                }
                Err(e) => log::error!("Session {}: couldn't reset for next hand: {}", self.id, e),
            }
            self.broadcast();
            return;
        }

        for payout in &outcome.payouts {
            let ticket = tickets.get(&payout.player_id).copied().unwrap_or_default();
            let win = self.transfer(payout.player_id, ticket, payout.amount, TransferReason::GameWin);
            self.credit_or_log(win).await;
        }
        let stacks: Vec<(PlayerId, u32, Chips)> = self
            .session
            .seats()
            .iter()
            .filter(|s| s.stack > 0)
            .map(|s| (s.player_id, s.ticket, s.stack))
            .collect();
        for (player_id, ticket, stack) in stacks {
            let cash_out = self.transfer(player_id, ticket, stack, TransferReason::CashOut);
            self.credit_or_log(cash_out).await;
        }
        log::info!(
            "Session {} hand {} settled: {} paid, {} rake",
            self.id,
            hand_no,
            outcome.total_paid(),
            outcome.rake
        );
        self.close();
    }

    /// Cancel whatever is in progress, refund every seat and close.
    async fn abort_hand(&mut self) -> TableResult<()> {
        let tickets = self.tickets();
        let refunds = self.session.abort()?;
        for (player_id, amount) in refunds {
            let ticket = tickets.get(&player_id).copied().unwrap_or_default();
            let refund = self.transfer(player_id, ticket, amount, TransferReason::Refund);
            self.credit_or_log(refund).await;
        }
        log::info!("Session {} aborted, all stacks refunded", self.id);
        self.broadcast();
        self.close();
        Ok(())
    }
}

fn keep_subscriber(
    player_id: PlayerId,
    sent: Result<(), mpsc::error::TrySendError<SessionEvent>>,
) -> bool {
    match sent {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!("Subscriber {} channel full, dropping event", player_id);
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            log::debug!("Subscriber {} disconnected, removing", player_id);
            false
        }
    }
}

//! Poker session state machine.
//!
//! A [`Session`] owns one table's worth of seats, the deck, the pot and the
//! turn pointer. Every mutation goes through its methods, which validate
//! first and only then move chips, so a rejected call leaves the session
//! untouched.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{
    DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_BIG_BLIND, DEFAULT_BUY_IN, DEFAULT_MAX_PLAYERS,
    DEFAULT_MAX_TIMEOUT_STRIKES, DEFAULT_SMALL_BLIND, HOLE_CARDS, MAX_COMMUNITY_CARDS, MAX_PLAYERS,
    MIN_PLAYERS,
};
use super::entities::{
    Action, Card, Chips, Deck, HandValue, Outcome, Payout, Phase, PlayerId, Seat, SeatIndex,
    SeatView, SessionId, SessionView,
};
use super::errors::{ActionError, SessionError};
use super::functional::{argmax, evaluate, layer_pots, rake, split_pot};

/// Game rules for a session.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_players: usize,
    pub max_players: usize,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
    pub action_timeout: Duration,
    pub max_timeout_strikes: u8,
    /// House cut in basis points of the called chips, taken only once the
    /// flop is dealt.
    pub rake_bps: u32,
    pub rake_cap: Option<Chips>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            min_players: MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
            min_buy_in: DEFAULT_BIG_BLIND,
            max_buy_in: DEFAULT_BUY_IN * 10,
            action_timeout: Duration::from_secs(DEFAULT_ACTION_TIMEOUT_SECS),
            max_timeout_strikes: DEFAULT_MAX_TIMEOUT_STRIKES,
            rake_bps: 0,
            rake_cap: None,
        }
    }
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be greater than 0".to_string());
        }
        if self.big_blind < self.small_blind {
            return Err("Big blind must be at least the small blind".to_string());
        }
        if self.min_players < MIN_PLAYERS || self.min_players > self.max_players {
            return Err(format!(
                "Min players must be between {MIN_PLAYERS} and max players"
            ));
        }
        if self.max_players > MAX_PLAYERS {
            return Err(format!("Max players must be at most {MAX_PLAYERS}"));
        }
        if self.min_buy_in < self.big_blind || self.max_buy_in < self.min_buy_in {
            return Err("Buy-in range must start at the big blind".to_string());
        }
        if self.max_timeout_strikes == 0 {
            return Err("Timeout strikes must be at least 1".to_string());
        }
        if self.rake_bps > 10_000 {
            return Err("Rake can't exceed the pot".to_string());
        }
        Ok(())
    }
}

/// A move the timeout sweep made on a stalled seat's behalf.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ForcedAction {
    pub player_id: PlayerId,
    pub action: Action,
    pub strikes: u8,
}

/// A seat taken off the table, with what's needed to put it back.
#[derive(Clone, Debug)]
pub struct RemovedSeat {
    pub idx: SeatIndex,
    pub seat: Seat,
    dealer_idx: SeatIndex,
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    settings: GameSettings,
    deck: Deck,
    /// Card order for the next hand, replacing the shuffle.
    stacked_deck: Option<Vec<Card>>,
    seats: Vec<Seat>,
    next_ticket: u32,
    pot: Chips,
    current_bet: Chips,
    /// Size of the last full raise this round.
    min_raise: Chips,
    dealer_idx: SeatIndex,
    acting_idx: Option<SeatIndex>,
    phase: Phase,
    community: Vec<Card>,
    hand_no: u32,
    hand_started_at: Option<DateTime<Utc>>,
    /// Restamped on every action and street, so it's also when the current
    /// turn began.
    last_action_at: Option<DateTime<Utc>>,
    outcome: Option<Outcome>,
}

impl Session {
    #[must_use]
    pub fn new(id: SessionId, settings: GameSettings) -> Self {
        Self {
            id,
            min_raise: settings.big_blind,
            seats: Vec::with_capacity(settings.max_players),
            settings,
            deck: Deck::new(),
            stacked_deck: None,
            next_ticket: 0,
            pot: 0,
            current_bet: 0,
            dealer_idx: 0,
            acting_idx: None,
            phase: Phase::Waiting,
            community: Vec::with_capacity(MAX_COMMUNITY_CARDS),
            hand_no: 1,
            hand_started_at: None,
            last_action_at: None,
            outcome: None,
        }
    }

    /// Deal the next hand from `cards` in order instead of a shuffled deck.
    #[must_use]
    pub fn with_deck(mut self, cards: Vec<Card>) -> Self {
        self.stack_deck(cards);
        self
    }

    /// Like [`Session::with_deck`], for a session that already exists.
    pub fn stack_deck(&mut self, cards: Vec<Card>) {
        self.stacked_deck = Some(cards);
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn community(&self) -> &[Card] {
        &self.community
    }

    pub fn dealer_idx(&self) -> SeatIndex {
        self.dealer_idx
    }

    pub fn acting_idx(&self) -> Option<SeatIndex> {
        self.acting_idx
    }

    pub fn acting_player(&self) -> Option<PlayerId> {
        self.acting_idx.map(|idx| self.seats[idx].player_id)
    }

    pub fn hand_no(&self) -> u32 {
        self.hand_no
    }

    pub fn hand_started_at(&self) -> Option<DateTime<Utc>> {
        self.hand_started_at
    }

    pub fn last_action_at(&self) -> Option<DateTime<Utc>> {
        self.last_action_at
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn seat_index(&self, player_id: PlayerId) -> Option<SeatIndex> {
        self.seats.iter().position(|s| s.player_id == player_id)
    }

    pub fn seat(&self, player_id: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player_id)
    }

    /// Chips held by all seats, in stacks or in the pot.
    pub fn total_chips(&self) -> Chips {
        self.seats.iter().map(Seat::holdings).sum()
    }

    // === Lifecycle ===

    /// Seat a player with `buy_in` chips. Returns the new seat's index.
    pub fn add_seat(
        &mut self,
        player_id: PlayerId,
        name: &str,
        buy_in: Chips,
    ) -> Result<SeatIndex, SessionError> {
        if self.phase != Phase::Waiting {
            return Err(SessionError::NotWaiting(self.phase));
        }
        if self.seat_index(player_id).is_some() {
            return Err(SessionError::AlreadySeated);
        }
        if self.seats.len() >= self.settings.max_players {
            return Err(SessionError::SessionFull);
        }
        if buy_in < self.settings.min_buy_in || buy_in > self.settings.max_buy_in {
            return Err(SessionError::InvalidBuyIn {
                min: self.settings.min_buy_in,
                max: self.settings.max_buy_in,
            });
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.seats.push(Seat::new(player_id, name, ticket, buy_in));
        Ok(self.seats.len() - 1)
    }

    /// Unseat a player while waiting. Returns the seat so its stack can be
    /// refunded, or put back with [`Session::reinstate_seat`] if that fails.
    pub fn remove_seat(&mut self, player_id: PlayerId) -> Result<RemovedSeat, SessionError> {
        if self.phase != Phase::Waiting {
            return Err(SessionError::NotWaiting(self.phase));
        }
        let idx = self.seat_index(player_id).ok_or(SessionError::NotSeated)?;
        let dealer_idx = self.dealer_idx;
        let seat = self.seats.remove(idx);
        if idx < self.dealer_idx {
            self.dealer_idx -= 1;
        }
        if self.dealer_idx >= self.seats.len() {
            self.dealer_idx = 0;
        }
        Ok(RemovedSeat {
            idx,
            seat,
            dealer_idx,
        })
    }

    /// Undo a [`Session::remove_seat`], button included.
    pub fn reinstate_seat(&mut self, removed: RemovedSeat) -> Result<(), SessionError> {
        if self.phase != Phase::Waiting {
            return Err(SessionError::NotWaiting(self.phase));
        }
        if self.seat_index(removed.seat.player_id).is_some() {
            return Err(SessionError::AlreadySeated);
        }
        let idx = removed.idx.min(self.seats.len());
        self.seats.insert(idx, removed.seat);
        self.dealer_idx = removed.dealer_idx.min(self.seats.len() - 1);
        Ok(())
    }

    /// Post blinds, deal hole cards and open pre-flop betting.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.phase != Phase::Waiting {
            return Err(SessionError::NotWaiting(self.phase));
        }
        if self.seats.len() < self.settings.min_players {
            return Err(SessionError::NotEnoughPlayers {
                required: self.settings.min_players,
            });
        }

        let num_seats = self.seats.len();
        let mut deck = match self.stacked_deck.take() {
            Some(cards) => Deck::stacked(cards),
            None => Deck::new(),
        };
        let mut hands = Vec::with_capacity(num_seats);
        for _ in 0..num_seats {
            hands.push(deck.deal(HOLE_CARDS)?);
        }

        for seat in &mut self.seats {
            seat.reset_for_hand();
        }
        self.deck = deck;
        self.community.clear();
        self.pot = 0;
        self.outcome = None;
        self.dealer_idx %= num_seats;

        let dealer = self.dealer_idx;
        let small_blind = (dealer + 1) % num_seats;
        let big_blind = (small_blind + 1) % num_seats;
        self.seats[dealer].roles.dealer = true;
        self.seats[small_blind].roles.small_blind = true;
        self.seats[big_blind].roles.big_blind = true;
        self.commit_chips(small_blind, self.settings.small_blind);
        self.commit_chips(big_blind, self.settings.big_blind);
        self.current_bet = self.seats.iter().map(|s| s.round_wager).max().unwrap_or(0);
        self.min_raise = self.settings.big_blind;

        // Deal starting left of the dealer, like the physical deal.
        for (offset, cards) in hands.into_iter().enumerate() {
            self.seats[(small_blind + offset) % num_seats].hole_cards = cards;
        }

        self.phase = Phase::PreFlop;
        self.hand_started_at = Some(now);
        self.last_action_at = Some(now);
        info!(
            "Session {} hand {} started: {} seats, dealer {}, blinds {}/{}",
            self.id,
            self.hand_no,
            num_seats,
            self.seats[dealer].name,
            self.settings.small_blind,
            self.settings.big_blind
        );

        self.acting_idx = self.next_to_act(big_blind);
        if self.acting_idx.is_none() {
            // Blinds put everyone all-in.
            self.advance_phase(now)?;
        }
        Ok(())
    }

    /// Cancel the hand. Every seat gets back its stack plus whatever it put
    /// into the pot.
    pub fn abort(&mut self) -> Result<Vec<(PlayerId, Chips)>, SessionError> {
        if self.phase == Phase::Finished {
            return Err(SessionError::AlreadyFinished);
        }
        let refunds: Vec<(PlayerId, Chips)> = self
            .seats
            .iter()
            .map(|s| (s.player_id, s.holdings()))
            .filter(|&(_, chips)| chips > 0)
            .collect();
        for seat in &mut self.seats {
            seat.stack = 0;
            seat.round_wager = 0;
            seat.total_wager = 0;
        }
        self.pot = 0;
        self.current_bet = 0;
        self.acting_idx = None;
        self.phase = Phase::Finished;
        self.outcome = Some(Outcome {
            payouts: refunds
                .iter()
                .map(|&(player_id, amount)| Payout {
                    player_id,
                    amount,
                    hand: None,
                })
                .collect(),
            rake: 0,
            uncontested: false,
            aborted: true,
        });
        info!("Session {} hand {} aborted", self.id, self.hand_no);
        Ok(refunds)
    }

    /// Roll a finished hand into the next one: winnings go onto stacks,
    /// seats that can't cover the big blind leave, and the button moves.
    /// Returns the stacks of the seats that left.
    pub fn next_hand(&mut self) -> Result<Vec<(PlayerId, Chips)>, SessionError> {
        let outcome = match (&self.phase, &self.outcome) {
            (Phase::Finished, Some(outcome)) if !outcome.aborted => outcome.clone(),
            (Phase::Finished, _) => return Err(SessionError::AlreadyFinished),
            _ => return Err(SessionError::HandInProgress),
        };
        for payout in &outcome.payouts {
            if let Some(seat) = self.seats.iter_mut().find(|s| s.player_id == payout.player_id) {
                seat.stack += payout.amount;
            }
        }

        let old_dealer = self.dealer_idx;
        let big_blind = self.settings.big_blind;
        let mut busted = Vec::new();
        let mut new_dealer = None;
        let mut kept = Vec::with_capacity(self.seats.len());
        for (idx, mut seat) in std::mem::take(&mut self.seats).into_iter().enumerate() {
            if seat.stack < big_blind {
                if seat.stack > 0 {
                    busted.push((seat.player_id, seat.stack));
                }
                continue;
            }
            if new_dealer.is_none() && idx > old_dealer {
                new_dealer = Some(kept.len());
            }
            seat.reset_for_hand();
            kept.push(seat);
        }
        self.seats = kept;
        self.dealer_idx = new_dealer.unwrap_or(0);

        self.pot = 0;
        self.current_bet = 0;
        self.min_raise = big_blind;
        self.community.clear();
        self.acting_idx = None;
        self.outcome = None;
        self.hand_no += 1;
        self.phase = Phase::Waiting;
        Ok(busted)
    }

    // === Action validation ===

    /// A seat can act while it is still in the hand with chips behind.
    pub fn can_act(&self, idx: SeatIndex) -> bool {
        self.seats
            .get(idx)
            .is_some_and(|s| !s.folded && !s.all_in && s.stack > 0)
    }

    fn needs_action(&self, idx: SeatIndex) -> bool {
        let seat = &self.seats[idx];
        self.can_act(idx) && (!seat.acted_this_round || seat.round_wager < self.current_bet)
    }

    /// Apply `action` for the player, by id.
    pub fn act(
        &mut self,
        player_id: PlayerId,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let idx = self
            .seat_index(player_id)
            .ok_or(ActionError::UnknownPlayer)?;
        self.apply_action(idx, action, now)
    }

    /// Validate and apply a voluntary action by the seat at `idx`.
    pub fn apply_action(
        &mut self,
        idx: SeatIndex,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.apply(idx, action, now, true)
    }

    fn apply(
        &mut self,
        idx: SeatIndex,
        action: Action,
        now: DateTime<Utc>,
        voluntary: bool,
    ) -> Result<(), SessionError> {
        if !self.phase.is_betting() {
            return Err(ActionError::NoHandInProgress.into());
        }
        let seat = self.seats.get(idx).ok_or(ActionError::UnknownPlayer)?;
        if seat.folded || seat.all_in {
            return Err(ActionError::SeatInactive.into());
        }
        if self.acting_idx != Some(idx) {
            return Err(ActionError::NotYourTurn.into());
        }

        let owed = self.current_bet.saturating_sub(seat.round_wager);
        let amount = match action {
            Action::Fold => 0,
            Action::Check if owed > 0 => return Err(ActionError::IllegalCheck.into()),
            Action::Check => 0,
            Action::Call if owed == 0 => return Err(ActionError::IllegalCall.into()),
            Action::Call => owed.min(seat.stack),
            Action::Raise(to) => {
                let min = self.current_bet + self.min_raise;
                let max = seat.round_wager + seat.stack;
                if to < min || to > max {
                    return Err(ActionError::IllegalRaiseAmount { min, max }.into());
                }
                to - seat.round_wager
            }
            Action::AllIn => seat.stack,
        };

        // Validated; from here on nothing fails.
        if action == Action::Fold {
            self.seats[idx].folded = true;
        }
        self.commit_chips(idx, amount);
        let round_wager = self.seats[idx].round_wager;
        if round_wager > self.current_bet {
            let increment = round_wager - self.current_bet;
            if increment >= self.min_raise {
                self.min_raise = increment;
            }
            self.current_bet = round_wager;
        }

        let seat = &mut self.seats[idx];
        seat.last_action = Some(action);
        seat.last_action_at = Some(now);
        seat.acted_this_round = true;
        if voluntary {
            seat.timeout_strikes = 0;
        }
        self.last_action_at = Some(now);
        debug!(
            "Session {} {}: {} {}",
            self.id, self.phase, self.seats[idx].name, action
        );

        self.progress(idx, now)
    }

    /// Move `amount` (capped at the stack) from a seat's stack into the pot.
    fn commit_chips(&mut self, idx: SeatIndex, amount: Chips) {
        let seat = &mut self.seats[idx];
        let amount = amount.min(seat.stack);
        seat.stack -= amount;
        seat.round_wager += amount;
        seat.total_wager += amount;
        if seat.stack == 0 {
            seat.all_in = true;
        }
        self.pot += amount;
    }

    // === Round and phase control ===

    fn contenders(&self) -> usize {
        self.seats.iter().filter(|s| !s.folded).count()
    }

    /// The first seat after `from` (wrapping) that still has to act.
    fn next_to_act(&self, from: SeatIndex) -> Option<SeatIndex> {
        let n = self.seats.len();
        (1..=n)
            .map(|offset| (from + offset) % n)
            .find(|&idx| self.needs_action(idx))
    }

    /// Whether the current betting round is over.
    pub fn is_betting_round_complete(&self) -> bool {
        if self.contenders() <= 1 {
            return true;
        }
        let able: Vec<SeatIndex> = (0..self.seats.len()).filter(|&i| self.can_act(i)).collect();
        match able.as_slice() {
            [] => true,
            [only] if self.seats[*only].round_wager >= self.current_bet => true,
            _ => !able.iter().any(|&i| self.needs_action(i)),
        }
    }

    fn progress(&mut self, last: SeatIndex, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.contenders() <= 1 {
            self.finish_uncontested();
            return Ok(());
        }
        if self.is_betting_round_complete() {
            return self.advance_phase(now);
        }
        self.acting_idx = self.next_to_act(last);
        Ok(())
    }

    /// Deal the next street, or go to showdown after the river. Streets
    /// with nobody left to bet are dealt straight through.
    pub fn advance_phase(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        loop {
            if self.contenders() <= 1 {
                self.finish_uncontested();
                return Ok(());
            }
            let (next, cards) = match self.phase {
                Phase::PreFlop => (Phase::Flop, 3),
                Phase::Flop => (Phase::Turn, 1),
                Phase::Turn => (Phase::River, 1),
                Phase::River => {
                    self.resolve_showdown();
                    return Ok(());
                }
                _ => return Err(ActionError::NoHandInProgress.into()),
            };
            let dealt = self.deck.deal(cards)?;
            self.community.extend(dealt);
            self.phase = next;

            for seat in &mut self.seats {
                seat.round_wager = 0;
                seat.acted_this_round = false;
            }
            self.current_bet = 0;
            self.min_raise = self.settings.big_blind;
            self.last_action_at = Some(now);
            debug!(
                "Session {} dealt {}: {:?}",
                self.id,
                self.phase,
                self.community.iter().map(ToString::to_string).collect::<Vec<_>>()
            );

            if self.is_betting_round_complete() {
                self.acting_idx = None;
                continue;
            }
            self.acting_idx = self.next_to_act(self.dealer_idx);
            return Ok(());
        }
    }

    // === Showdown and payouts ===

    /// Chips matched by at least two seats. The rest is an uncalled bet and
    /// goes back to whoever made it.
    fn contested_pot(&self) -> Chips {
        let contributions: Vec<Chips> = self.seats.iter().map(|s| s.total_wager).collect();
        layer_pots(&contributions)
            .into_iter()
            .filter(|layer| layer.contributors.len() > 1)
            .map(|layer| layer.amount)
            .sum()
    }

    fn pot_rake(&self) -> Chips {
        if self.community.len() < 3 {
            return 0;
        }
        rake(self.contested_pot(), self.settings.rake_bps, self.settings.rake_cap)
    }

    fn finish_uncontested(&mut self) {
        let Some(winner) = self.seats.iter().position(|s| !s.folded) else {
            return;
        };
        let rake = self.pot_rake();
        let seat = &self.seats[winner];
        info!(
            "Session {} hand {}: {} wins {} uncontested",
            self.id,
            self.hand_no,
            seat.name,
            self.pot - rake
        );
        self.outcome = Some(Outcome {
            payouts: vec![Payout {
                player_id: seat.player_id,
                amount: self.pot - rake,
                hand: None,
            }],
            rake,
            uncontested: true,
            aborted: false,
        });
        self.acting_idx = None;
        self.phase = Phase::Finished;
    }

    /// Rank every hand still in and award each pot layer to the best hand
    /// among the seats that paid into it.
    pub fn resolve_showdown(&mut self) {
        self.phase = Phase::Showdown;
        self.acting_idx = None;

        let hands: Vec<Option<HandValue>> = self
            .seats
            .iter()
            .map(|s| (!s.folded).then(|| evaluate(&s.hole_cards, &self.community)))
            .collect();
        let contributions: Vec<Chips> = self.seats.iter().map(|s| s.total_wager).collect();
        let live: Vec<SeatIndex> = (0..self.seats.len()).filter(|&i| hands[i].is_some()).collect();

        let rake = self.pot_rake();
        let mut rake_left = rake;
        let mut won = vec![0 as Chips; self.seats.len()];
        for layer in layer_pots(&contributions) {
            let taken = if layer.contributors.len() > 1 {
                rake_left.min(layer.amount)
            } else {
                0
            };
            rake_left -= taken;
            let amount = layer.amount - taken;

            let mut eligible: Vec<SeatIndex> = layer
                .contributors
                .iter()
                .copied()
                .filter(|&i| hands[i].is_some())
                .collect();
            if eligible.is_empty() {
                // Only folded seats reached this level; the live hands share it.
                eligible.clone_from(&live);
            }
            let values: Vec<HandValue> = eligible
                .iter()
                .filter_map(|&i| hands[i].clone())
                .collect();
            let winners: Vec<SeatIndex> = argmax(&values).into_iter().map(|w| eligible[w]).collect();
            for (idx, share) in self.distribute_pot(&winners, amount) {
                won[idx] += share;
            }
        }

        let payouts: Vec<Payout> = won
            .iter()
            .enumerate()
            .filter(|&(_, &amount)| amount > 0)
            .map(|(idx, &amount)| Payout {
                player_id: self.seats[idx].player_id,
                amount,
                hand: hands[idx].clone(),
            })
            .collect();
        for payout in &payouts {
            info!(
                "Session {} hand {}: player {} wins {} with {}",
                self.id,
                self.hand_no,
                payout.player_id,
                payout.amount,
                payout.hand.as_ref().map_or_else(String::new, ToString::to_string)
            );
        }
        self.outcome = Some(Outcome {
            payouts,
            rake,
            uncontested: false,
            aborted: false,
        });
        self.phase = Phase::Finished;
    }

    /// Split `amount` among the winning seats; odd chips go in seat order
    /// starting left of the dealer.
    pub fn distribute_pot(&self, winners: &[SeatIndex], amount: Chips) -> Vec<(SeatIndex, Chips)> {
        let n = self.seats.len();
        split_pot(amount, winners, (self.dealer_idx + 1) % n.max(1), n)
    }

    // === Timeouts ===

    /// Act for the acting seat if its turn has run past the timeout. After
    /// the configured number of strikes the seat is folded; before that it
    /// checks or calls.
    pub fn check_timeout(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<ForcedAction>, SessionError> {
        if !self.phase.is_betting() {
            return Ok(None);
        }
        let (Some(idx), Some(turn_started)) = (self.acting_idx, self.last_action_at) else {
            return Ok(None);
        };
        let expired = now
            .signed_duration_since(turn_started)
            .to_std()
            .is_ok_and(|elapsed| elapsed > self.settings.action_timeout);
        if !expired {
            return Ok(None);
        }

        let seat = &mut self.seats[idx];
        seat.timeout_strikes += 1;
        let strikes = seat.timeout_strikes;
        let action = if strikes >= self.settings.max_timeout_strikes {
            Action::Fold
        } else if seat.round_wager >= self.current_bet {
            Action::Check
        } else {
            Action::Call
        };
        let player_id = seat.player_id;
        info!(
            "Session {}: {} timed out (strike {}), forcing {}",
            self.id, seat.name, strikes, action
        );
        self.apply(idx, action, now, false)?;
        Ok(Some(ForcedAction {
            player_id,
            action,
            strikes,
        }))
    }

    // === Views ===

    /// Snapshot of the session as `viewer` may see it. Hole cards are only
    /// included for the viewer's own seat.
    pub fn view(&self, viewer: Option<PlayerId>) -> SessionView {
        SessionView {
            session_id: self.id,
            hand_no: self.hand_no,
            phase: self.phase,
            pot: self.pot,
            current_bet: self.current_bet,
            min_raise: self.min_raise,
            small_blind: self.settings.small_blind,
            big_blind: self.settings.big_blind,
            community: self.community.clone(),
            acting: self.acting_player(),
            seats: self
                .seats
                .iter()
                .map(|s| SeatView {
                    player_id: s.player_id,
                    name: s.name.clone(),
                    stack: s.stack,
                    round_wager: s.round_wager,
                    total_wager: s.total_wager,
                    folded: s.folded,
                    all_in: s.all_in,
                    roles: s.roles,
                    last_action: s.last_action,
                    timeout_strikes: s.timeout_strikes,
                    hole_cards: if viewer == Some(s.player_id) {
                        s.hole_cards.clone()
                    } else {
                        Vec::new()
                    },
                })
                .collect(),
            outcome: self.outcome.clone(),
        }
    }
}

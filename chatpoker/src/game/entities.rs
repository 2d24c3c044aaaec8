use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::SessionError;

/// Whole chips. Stacks, wagers and pots are all counted in chips.
pub type Chips = u32;

/// Identifier of a player as known to the ledger and transport.
pub type PlayerId = i64;

/// Identifier of a poker session.
pub type SessionId = i64;

/// Seat positions within a session, in join order.
pub type SeatIndex = usize;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Card value, 2 through 14 (ace high).
pub type Value = u8;

pub const ACE: Value = 14;

/// A card is a value and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            14 => write!(f, "A{}", self.1),
            13 => write!(f, "K{}", self.1),
            12 => write!(f, "Q{}", self.1),
            11 => write!(f, "J{}", self.1),
            v => write!(f, "{v}{}", self.1),
        }
    }
}

/// Hand categories from weakest to strongest.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// A ranked hand. Ordering is by category first, then by the tie-break
/// values (most significant first), so two hands compare exactly the way
/// poker rules compare them.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandValue {
    pub rank: Rank,
    pub kickers: Vec<Value>,
}

impl fmt::Display for HandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank)
    }
}

/// A shuffled deck that deals without replacement.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Returns a uniformly shuffled 52-card deck.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(&mut rand::rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = Self::ordered_cards();
        cards.shuffle(rng);
        Self { cards }
    }

    /// A deck that deals `cards` in the given order. Used to replay hands.
    #[must_use]
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    fn ordered_cards() -> Vec<Card> {
        let mut cards = Vec::with_capacity(52);
        for value in 2..=ACE {
            for suit in Suit::ALL {
                cards.push(Card(value, suit));
            }
        }
        cards
    }

    /// Remove and return the next `n` cards.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, SessionError> {
        if self.cards.len() < n {
            return Err(SessionError::DeckExhausted {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand phases of a session.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Phase {
    Waiting,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

impl Phase {
    /// Whether seats take betting actions in this phase.
    #[must_use]
    pub fn is_betting(self) -> bool {
        matches!(self, Self::PreFlop | Self::Flop | Self::Turn | Self::River)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// A betting action. `Raise` carries the total the seat's round wager is
/// raised to, not the increment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    AllIn,
    Call,
    Check,
    Fold,
    Raise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AllIn => write!(f, "all-in"),
            Self::Call => write!(f, "call"),
            Self::Check => write!(f, "check"),
            Self::Fold => write!(f, "fold"),
            Self::Raise(amount) => write!(f, "raise to {amount}"),
        }
    }
}

/// Positional roles for the current hand.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Roles {
    pub dealer: bool,
    pub small_blind: bool,
    pub big_blind: bool,
}

/// A player's seat within one session.
#[derive(Clone, Debug)]
pub struct Seat {
    pub player_id: PlayerId,
    /// Display name captured when the player joined.
    pub name: String,
    /// Join ticket, unique within the session. Keys ledger transfers so a
    /// player who leaves and rejoins gets fresh idempotency keys.
    pub ticket: u32,
    pub stack: Chips,
    /// Stack at the start of the current hand.
    pub entry_stack: Chips,
    pub hole_cards: Vec<Card>,
    pub round_wager: Chips,
    pub total_wager: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub roles: Roles,
    pub last_action: Option<Action>,
    pub last_action_at: Option<DateTime<Utc>>,
    /// Set once the seat has acted in the current betting round. Blind
    /// posts don't count.
    pub acted_this_round: bool,
    pub timeout_strikes: u8,
}

impl Seat {
    #[must_use]
    pub fn new(player_id: PlayerId, name: &str, ticket: u32, stack: Chips) -> Self {
        Self {
            player_id,
            name: name.to_string(),
            ticket,
            stack,
            entry_stack: stack,
            hole_cards: Vec::with_capacity(2),
            round_wager: 0,
            total_wager: 0,
            folded: false,
            all_in: false,
            roles: Roles::default(),
            last_action: None,
            last_action_at: None,
            acted_this_round: false,
            timeout_strikes: 0,
        }
    }

    /// Clear everything that belongs to a single hand.
    pub fn reset_for_hand(&mut self) {
        self.entry_stack = self.stack;
        self.hole_cards.clear();
        self.round_wager = 0;
        self.total_wager = 0;
        self.folded = false;
        self.all_in = false;
        self.roles = Roles::default();
        self.last_action = None;
        self.acted_this_round = false;
        self.timeout_strikes = 0;
    }

    /// Chips this seat still has in play for the hand.
    #[must_use]
    pub fn holdings(&self) -> Chips {
        self.stack + self.total_wager
    }
}

/// Chips paid to a seat at the end of a hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub player_id: PlayerId,
    pub amount: Chips,
    /// The winning hand, absent for uncontested pots.
    pub hand: Option<HandValue>,
}

/// How a hand ended.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Outcome {
    pub payouts: Vec<Payout>,
    pub rake: Chips,
    /// Everyone else folded; no cards were compared.
    pub uncontested: bool,
    /// The hand was cancelled and chips returned instead of awarded.
    pub aborted: bool,
}

impl Outcome {
    #[must_use]
    pub fn total_paid(&self) -> Chips {
        self.payouts.iter().map(|p| p.amount).sum()
    }

    #[must_use]
    pub fn paid_to(&self, player_id: PlayerId) -> Chips {
        self.payouts
            .iter()
            .filter(|p| p.player_id == player_id)
            .map(|p| p.amount)
            .sum()
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub player_id: PlayerId,
    pub name: String,
    pub stack: Chips,
    pub round_wager: Chips,
    pub total_wager: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub roles: Roles,
    pub last_action: Option<Action>,
    pub timeout_strikes: u8,
    /// Only filled in for the seat the view was rendered for.
    pub hole_cards: Vec<Card>,
}

/// Read-only snapshot of a session, rendered for one viewer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub hand_no: u32,
    pub phase: Phase,
    pub pot: Chips,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub community: Vec<Card>,
    pub acting: Option<PlayerId>,
    pub seats: Vec<SeatView>,
    pub outcome: Option<Outcome>,
}

impl SessionView {
    #[must_use]
    pub fn seat(&self, player_id: PlayerId) -> Option<&SeatView> {
        self.seats.iter().find(|s| s.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_deck_has_52_unique_cards() {
        let mut deck = Deck::new();
        let cards = deck.deal(52).unwrap();
        let unique: HashSet<_> = cards.iter().collect();
        assert_eq!(unique.len(), 52);
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    fn test_deck_deal_removes_cards() {
        let mut deck = Deck::new();
        let first = deck.deal(2).unwrap();
        let rest = deck.deal(50).unwrap();
        assert!(first.iter().all(|c| !rest.contains(c)));
    }

    #[test]
    fn test_deck_exhausted() {
        let mut deck = Deck::new();
        deck.deal(50).unwrap();
        let err = deck.deal(3).unwrap_err();
        assert_eq!(
            err,
            SessionError::DeckExhausted {
                requested: 3,
                remaining: 2
            }
        );
        // A failed deal leaves the deck untouched.
        assert_eq!(deck.remaining(), 2);
    }

    #[test]
    fn test_seeded_decks_match() {
        let a = Deck::with_rng(&mut StdRng::seed_from_u64(7)).deal(52).unwrap();
        let b = Deck::with_rng(&mut StdRng::seed_from_u64(7)).deal(52).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card(14, Suit::Spade).to_string(), "A♠");
        assert_eq!(Card(10, Suit::Heart).to_string(), "10♥");
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Rank::StraightFlush > Rank::FourOfAKind);
        assert!(Rank::Flush > Rank::Straight);
        assert!(Rank::OnePair > Rank::HighCard);
    }

    #[test]
    fn test_seat_reset_for_hand() {
        let mut seat = Seat::new(1, "alice", 0, 500);
        seat.stack = 400;
        seat.total_wager = 100;
        seat.folded = true;
        seat.timeout_strikes = 2;
        seat.reset_for_hand();
        assert_eq!(seat.entry_stack, 400);
        assert_eq!(seat.total_wager, 0);
        assert!(!seat.folded);
        assert_eq!(seat.timeout_strikes, 0);
    }
}

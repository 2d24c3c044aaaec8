use super::entities::Chips;

/// Hole cards plus a full board for every seat must fit in one deck.
pub const MAX_PLAYERS: usize = 23;
pub const MIN_PLAYERS: usize = 2;

pub const DEFAULT_MAX_PLAYERS: usize = 9;
pub const DEFAULT_SMALL_BLIND: Chips = 10;
pub const DEFAULT_BIG_BLIND: Chips = 20;
pub const DEFAULT_BUY_IN: Chips = 1_000;
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

/// Consecutive timeouts before a seat is folded instead of auto-played.
pub const DEFAULT_MAX_TIMEOUT_STRIKES: u8 = 3;

/// Rake is expressed in basis points of the pot.
pub const BASIS_POINTS: u64 = 10_000;

pub const HOLE_CARDS: usize = 2;
pub const MAX_COMMUNITY_CARDS: usize = 5;

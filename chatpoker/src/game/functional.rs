//! Pure functions for hand ranking and pot arithmetic.

use std::cmp::Reverse;

use super::entities::{ACE, Card, Chips, HandValue, Rank, SeatIndex, Value};

/// Rank the best hand that can be made from the hole and community cards.
///
/// With seven cards every 5-card combination is ranked and the best kept.
/// Fewer than five cards are ranked as-is (straights and flushes need five).
#[must_use]
pub fn evaluate(hole: &[Card], community: &[Card]) -> HandValue {
    let cards: Vec<Card> = hole.iter().chain(community).copied().collect();
    if cards.len() <= 5 {
        return eval_five(&cards);
    }

    let n = cards.len();
    let mut best: Option<HandValue> = None;
    let mut five = Vec::with_capacity(5);
    for mask in 0u32..(1 << n) {
        if mask.count_ones() != 5 {
            continue;
        }
        five.clear();
        five.extend((0..n).filter(|i| mask & (1 << i) != 0).map(|i| cards[i]));
        let value = eval_five(&five);
        if best.as_ref().is_none_or(|b| value > *b) {
            best = Some(value);
        }
    }
    best.unwrap_or_else(|| eval_five(&cards[..5]))
}

/// Rank a hand of at most five cards.
fn eval_five(cards: &[Card]) -> HandValue {
    if cards.is_empty() {
        return HandValue {
            rank: Rank::HighCard,
            kickers: Vec::new(),
        };
    }
    let mut counts = [0u8; ACE as usize + 1];
    for card in cards {
        counts[card.0 as usize] += 1;
    }

    // (count, value) groups, biggest group first, then highest value.
    let mut groups: Vec<(u8, Value)> = (2..=ACE)
        .filter(|&v| counts[v as usize] > 0)
        .map(|v| (counts[v as usize], v))
        .collect();
    groups.sort_by_key(|&(count, value)| Reverse((count, value)));
    let grouped: Vec<Value> = groups.iter().map(|&(_, v)| v).collect();

    let is_flush = cards.len() == 5 && cards.iter().all(|c| c.1 == cards[0].1);
    let straight_high = if groups.len() == 5 {
        straight_high(&grouped)
    } else {
        None
    };

    let (rank, kickers) = match (straight_high, is_flush) {
        (Some(high), true) => (Rank::StraightFlush, vec![high]),
        _ if groups[0].0 == 4 => (Rank::FourOfAKind, grouped),
        _ if groups[0].0 == 3 && groups.get(1).is_some_and(|g| g.0 == 2) => {
            (Rank::FullHouse, grouped)
        }
        (_, true) => (Rank::Flush, grouped),
        (Some(high), false) => (Rank::Straight, vec![high]),
        _ if groups[0].0 == 3 => (Rank::ThreeOfAKind, grouped),
        _ if groups[0].0 == 2 && groups.get(1).is_some_and(|g| g.0 == 2) => {
            (Rank::TwoPair, grouped)
        }
        _ if groups[0].0 == 2 => (Rank::OnePair, grouped),
        _ => (Rank::HighCard, grouped),
    };
    HandValue { rank, kickers }
}

/// High card of a straight made from five distinct values sorted high to
/// low. The wheel (A-2-3-4-5) is five-high.
fn straight_high(desc: &[Value]) -> Option<Value> {
    if desc.windows(2).all(|w| w[0] == w[1] + 1) {
        return Some(desc[0]);
    }
    if desc == [ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

/// Indices of every hand sharing the best value.
#[must_use]
pub fn argmax(hands: &[HandValue]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, h)| *h == best)
        .map(|(i, _)| i)
        .collect()
}

/// One layer of the pot and the seats that paid into it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PotLayer {
    pub amount: Chips,
    pub contributors: Vec<SeatIndex>,
}

/// Split total contributions into layers. Each layer is the slice of the
/// pot between two consecutive contribution levels, so a seat is only ever
/// in contention for chips it matched.
#[must_use]
pub fn layer_pots(contributions: &[Chips]) -> Vec<PotLayer> {
    let mut levels: Vec<Chips> = contributions.iter().copied().filter(|&c| c > 0).collect();
    levels.sort_unstable();
    levels.dedup();

    let mut layers = Vec::with_capacity(levels.len());
    let mut floor = 0;
    for level in levels {
        let contributors: Vec<SeatIndex> = contributions
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c >= level)
            .map(|(i, _)| i)
            .collect();
        let amount = (level - floor) * contributors.len() as Chips;
        layers.push(PotLayer {
            amount,
            contributors,
        });
        floor = level;
    }
    layers
}

/// Split `amount` evenly among `winners`. Odd chips go one at a time to
/// winners in seat order starting at `first_seat` and wrapping around the
/// table of `num_seats`.
#[must_use]
pub fn split_pot(
    amount: Chips,
    winners: &[SeatIndex],
    first_seat: SeatIndex,
    num_seats: usize,
) -> Vec<(SeatIndex, Chips)> {
    if winners.is_empty() || num_seats == 0 {
        return Vec::new();
    }
    let mut ordered = winners.to_vec();
    ordered.sort_by_key(|&seat| (seat + num_seats - first_seat % num_seats) % num_seats);
    ordered.dedup();

    let share = amount / ordered.len() as Chips;
    let odd = (amount % ordered.len() as Chips) as usize;
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, seat)| (seat, share + Chips::from(i < odd)))
        .collect()
}

/// House cut of `pot` in basis points, capped at `cap` when given.
#[must_use]
pub fn rake(pot: Chips, bps: u32, cap: Option<Chips>) -> Chips {
    let cut = (u64::from(pot) * u64::from(bps) / super::constants::BASIS_POINTS) as Chips;
    cap.map_or(cut, |cap| cut.min(cap))
}

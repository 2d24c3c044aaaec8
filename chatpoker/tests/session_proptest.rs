/// Property-based tests for the session state machine
///
/// Random tables play random legal actions to the end of a hand while the
/// chip accounting is checked after every step.
use chatpoker::game::constants::MAX_COMMUNITY_CARDS;
use chatpoker::game::{Action, Card, Chips, GameSettings, Phase, Session, Suit};
use chrono::{TimeDelta, Utc};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

const MAX_STEPS: usize = 400;

fn shuffled_deck(seed: u64) -> Vec<Card> {
    let mut cards: Vec<Card> = (2..=14)
        .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
        .collect();
    cards.shuffle(&mut StdRng::seed_from_u64(seed));
    cards
}

fn table_strategy() -> impl Strategy<Value = Vec<Chips>> {
    prop::collection::vec(20u32..=2000, 2..=6)
}

fn seated_session(buy_ins: &[Chips], seed: u64, rake_bps: u32) -> Session {
    let settings = GameSettings {
        rake_bps,
        rake_cap: Some(50),
        ..GameSettings::default()
    };
    let mut session = Session::new(1, settings).with_deck(shuffled_deck(seed));
    for (i, &buy_in) in buy_ins.iter().enumerate() {
        session
            .add_seat(i as i64 + 1, &format!("player{i}"), buy_in)
            .unwrap();
    }
    session
}

/// Pick a legal action for the acting seat from a random selector.
fn choose_action(session: &Session, selector: u32) -> Action {
    let idx = session.acting_idx().unwrap();
    let seat = &session.seats()[idx];
    let owed = session.current_bet().saturating_sub(seat.round_wager);
    let passive = if owed > 0 { Action::Call } else { Action::Check };
    match selector % 6 {
        0 => Action::Fold,
        1 | 2 | 3 => passive,
        4 => {
            let min = session.current_bet() + session.min_raise();
            let max = seat.round_wager + seat.stack;
            if min <= max {
                Action::Raise(min + selector % (max - min + 1))
            } else {
                Action::AllIn
            }
        }
        _ => Action::AllIn,
    }
}

fn assert_hand_invariants(session: &Session) -> Result<(), TestCaseError> {
    let wagered: Chips = session.seats().iter().map(|s| s.total_wager).sum();
    prop_assert_eq!(session.pot(), wagered);
    for seat in session.seats() {
        prop_assert_eq!(
            seat.stack + seat.total_wager,
            seat.entry_stack,
            "{} lost track of chips",
            seat.name
        );
    }
    let highest = session.seats().iter().map(|s| s.round_wager).max().unwrap_or(0);
    prop_assert_eq!(session.current_bet(), highest);
    if let Some(idx) = session.acting_idx() {
        prop_assert!(session.can_act(idx), "seat {idx} has the turn but can't act");
    }
    prop_assert!(session.community().len() <= MAX_COMMUNITY_CARDS);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_random_hand_conserves_chips(
        buy_ins in table_strategy(),
        seed in any::<u64>(),
        rake_bps in 0u32..=1000,
        selectors in prop::collection::vec(any::<u32>(), MAX_STEPS)
    ) {
        let mut session = seated_session(&buy_ins, seed, rake_bps);
        let total: Chips = buy_ins.iter().sum();
        let mut now = Utc::now();

        session.start(now).unwrap();
        prop_assert_eq!(session.total_chips(), total);
        assert_hand_invariants(&session)?;

        for &selector in &selectors {
            if session.phase() == Phase::Finished {
                break;
            }
            prop_assert!(session.phase().is_betting());
            now += TimeDelta::seconds(1);
            let action = choose_action(&session, selector);
            let result = session.apply_action(session.acting_idx().unwrap(), action, now);
            prop_assert!(result.is_ok(), "{action} rejected: {result:?}");

            prop_assert_eq!(session.total_chips(), total);
            assert_hand_invariants(&session)?;
        }

        prop_assert_eq!(session.phase(), Phase::Finished);
        let outcome = session.outcome().unwrap();
        prop_assert_eq!(outcome.total_paid() + outcome.rake, session.pot());
        // Contested hands are always run out to the river.
        prop_assert!(outcome.uncontested || session.community().len() == 5);
        if session.community().len() < 3 {
            prop_assert_eq!(outcome.rake, 0);
        }
        prop_assert!(outcome.rake <= 50);
    }

    /// Rolling into the next hand keeps every chip except the rake.
    #[test]
    fn test_next_hand_keeps_chips_minus_rake(
        buy_ins in table_strategy(),
        seed in any::<u64>(),
        rake_bps in 0u32..=1000,
        selectors in prop::collection::vec(any::<u32>(), MAX_STEPS)
    ) {
        let mut session = seated_session(&buy_ins, seed, rake_bps);
        let total: Chips = buy_ins.iter().sum();
        let now = Utc::now();

        session.start(now).unwrap();
        for &selector in &selectors {
            if session.phase() == Phase::Finished {
                break;
            }
            let action = choose_action(&session, selector);
            session.apply_action(session.acting_idx().unwrap(), action, now).unwrap();
        }
        let rake = session.outcome().unwrap().rake;

        let busted = session.next_hand().unwrap();
        let cashed_out: Chips = busted.iter().map(|&(_, chips)| chips).sum();
        let seated: Chips = session.seats().iter().map(|s| s.stack).sum();
        // Seats left with nothing are dropped without a cash-out.
        prop_assert_eq!(seated + cashed_out + rake, total);
        prop_assert_eq!(session.phase(), Phase::Waiting);
        prop_assert_eq!(session.pot(), 0);
        prop_assert!(session.seats().iter().all(|s| s.stack >= session.settings().big_blind));
    }

    /// A rejected action must leave the session exactly as it was.
    #[test]
    fn test_rejected_action_changes_nothing(
        buy_ins in table_strategy(),
        seed in any::<u64>(),
        selectors in prop::collection::vec(any::<u32>(), MAX_STEPS)
    ) {
        let mut session = seated_session(&buy_ins, seed, 0);
        let now = Utc::now();
        session.start(now).unwrap();

        for &selector in &selectors {
            if session.phase() == Phase::Finished {
                break;
            }
            let idx = session.acting_idx().unwrap();
            let before = session.view(None);

            // Raising to the current bet is never a raise.
            let illegal = session.apply_action(idx, Action::Raise(session.current_bet()), now);
            prop_assert!(illegal.is_err());
            let out_of_turn = session.apply_action((idx + 1) % buy_ins.len(), Action::Check, now);
            prop_assert!(out_of_turn.is_err());
            prop_assert_eq!(&session.view(None), &before);

            let action = choose_action(&session, selector);
            session.apply_action(idx, action, now).unwrap();
        }
    }
}

use chatpoker::{
    entities::{Card, Suit},
    functional::{argmax, evaluate, layer_pots},
    game::{Action, GameSettings, Phase, Session},
};
use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

/// Session with `n_players` seated and the first hand dealt
fn setup_session_with_players(n_players: usize) -> Session {
    let mut session = Session::new(1, GameSettings::default());
    for i in 0..n_players {
        session
            .add_seat(i as i64 + 1, &format!("player{}", i), 1_000)
            .unwrap();
    }
    session.start(Utc::now()).unwrap();
    session
}

/// Benchmark hand evaluation with 2 cards (pocket cards)
fn bench_hand_eval_2_cards(c: &mut Criterion) {
    let hole = [Card(14, Suit::Spade), Card(13, Suit::Spade)];

    c.bench_function("hand_eval_2_cards", |b| {
        b.iter(|| evaluate(&hole, &[]));
    });
}

/// Benchmark hand evaluation with 7 cards (full hand + board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let hole = [Card(14, Suit::Spade), Card(13, Suit::Spade)];
    let board = [
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade), // royal flush
        Card(2, Suit::Heart),
        Card(3, Suit::Diamond),
    ];

    c.bench_function("hand_eval_7_cards", |b| {
        b.iter(|| evaluate(&hole, &board));
    });
}

/// Benchmark hand evaluation 100 times with random-ish hands
fn bench_hand_eval_100_iterations(c: &mut Criterion) {
    let all_hands: Vec<Vec<Card>> = (0..100u8)
        .map(|i| {
            let base = i % 13 + 2;
            (0..7u8)
                .map(|offset| Card((base + offset).min(14), Suit::ALL[usize::from(offset % 4)]))
                .collect()
        })
        .collect();

    c.bench_function("hand_eval_100_iterations", |b| {
        b.iter(|| {
            all_hands
                .iter()
                .map(|cards| evaluate(&cards[..2], &cards[2..]))
                .collect::<Vec<_>>()
        });
    });
}

/// Benchmark hand comparison (argmax) with multiple hands
fn bench_hand_comparison(c: &mut Criterion) {
    let board = [Card(9, Suit::Diamond), Card(5, Suit::Heart), Card(13, Suit::Club)];
    let hands = vec![
        // High card
        evaluate(&[Card(2, Suit::Club), Card(7, Suit::Heart)], &board),
        // Pair
        evaluate(&[Card(2, Suit::Club), Card(2, Suit::Heart)], &board),
        // Two pair
        evaluate(&[Card(9, Suit::Club), Card(5, Suit::Spade)], &board),
        // Three of a kind
        evaluate(&[Card(9, Suit::Club), Card(9, Suit::Spade)], &board),
    ];

    c.bench_function("hand_comparison_4_hands", |b| {
        b.iter(|| argmax(&hands));
    });
}

/// Benchmark side pot layering with staggered all-ins
fn bench_layer_pots(c: &mut Criterion) {
    let contributions = [50, 1_000, 200, 1_000, 75, 400, 1_000, 0, 300];

    c.bench_function("layer_pots_9_seats", |b| {
        b.iter(|| layer_pots(&contributions));
    });
}

/// Benchmark view generation with different player counts
fn bench_view_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_generation");

    for n_players in [2, 4, 6, 9].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                let session = setup_session_with_players(n);
                b.iter(|| session.view(Some(1)));
            },
        );
    }

    group.finish();
}

/// Benchmark a whole hand: everyone calls to the river, then showdown
fn bench_full_hand(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_hand");

    for n_players in [2, 9].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                b.iter_batched(
                    || setup_session_with_players(n),
                    |mut session| {
                        let now = Utc::now();
                        while session.phase() != Phase::Finished {
                            let Some(idx) = session.acting_idx() else {
                                break;
                            };
                            let owed = session.current_bet() > session.seats()[idx].round_wager;
                            let action = if owed { Action::Call } else { Action::Check };
                            session.apply_action(idx, action, now).unwrap();
                        }
                        session
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    hand_evaluation,
    bench_hand_eval_2_cards,
    bench_hand_eval_7_cards,
    bench_hand_eval_100_iterations,
    bench_hand_comparison,
    bench_layer_pots,
);

criterion_group!(game_operations, bench_view_generation, bench_full_hand);

criterion_main!(hand_evaluation, game_operations);

//! Benchmarks for the per-turn scheduler body.
//!
//! Each tick builds one fogged view and one patch per player, so the cost
//! grows with both map area and roster size.

#![allow(missing_docs)]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use conquer::room::RoomConfig;
use conquer::{MemoryReplayStore, ReplayStore, SelfPlay, SimConfig};

fn game(players: usize, max_turns: u32) -> SelfPlay {
    let config = SimConfig {
        players,
        max_turns,
        room: RoomConfig {
            map_width: 1.0,
            map_height: 1.0,
            ..RoomConfig::default()
        },
    };
    let replays: Arc<dyn ReplayStore> = Arc::new(MemoryReplayStore::new());
    (0..100)
        .find_map(|seed| SelfPlay::new(seed, &config, Arc::clone(&replays)).ok())
        .unwrap_or_else(|| panic!("no seed fits {players} players"))
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("self_play_step");
    for players in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(players), &players, |b, &players| {
            b.iter_batched(
                || game(players, u32::MAX),
                |mut game| {
                    for _ in 0..50 {
                        let _ = black_box(game.step());
                    }
                    game
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_short_game(c: &mut Criterion) {
    c.bench_function("self_play_300_turns_2p", |b| {
        b.iter_batched(
            || game(2, 300),
            |game| black_box(game.run()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_step, bench_short_game);
criterion_main!(benches);

//! Frame benchmarks for tank_sim.
//!
//! Run with: `cargo bench` (add `--no-default-features` for the
//! single-threaded gather phases).

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tank_sim::{BattleConfig, BattleWorld};

fn battle() -> BattleWorld {
    let config = BattleConfig {
        max_frames: None,
        ..Default::default()
    };
    match BattleWorld::with_default_battle(config) {
        Ok(battle) => battle,
        Err(err) => panic!("default battle config rejected: {err}"),
    }
}

/// One frame of the full reference battle (2558 tanks).
pub fn frame_benchmark(c: &mut Criterion) {
    c.bench_function("first_frame_full_battle", |b| {
        b.iter_batched(battle, |mut battle| battle.run_frame(), BatchSize::LargeInput)
    });

    // Mid-battle: rockets and effects in flight
    let mut warm = battle();
    for _ in 0..300 {
        warm.run_frame();
    }
    c.bench_function("frame_after_300", |b| {
        b.iter(|| {
            warm.run_frame();
            black_box(warm.current_frame())
        })
    });
}

criterion_group!(benches, frame_benchmark);
criterion_main!(benches);

//! Runs the reference tank battle headless and reports timing.
//!
//! Run with: cargo run --release --example battle_demo [config.ron]
//!
//! Set `RUST_LOG=tank_sim=debug` for per-frame summaries.

use std::time::Duration;
use tank_sim::{BattleConfig, BattleWorld, Faction, FrameProfiler};
use tracing_subscriber::EnvFilter;

/// Duration of a full default run on the baseline machine. Replace it with
/// your own measurement to track speedups.
const REF_PERFORMANCE: Duration = Duration::from_millis(73_466);

fn main() -> tank_sim::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tank_sim=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::args().nth(1) {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };

    let mut battle = BattleWorld::with_default_battle(config)?;
    let mut profiler = FrameProfiler::new();

    while !battle.is_finished() {
        profiler.time_frame(|| battle.run_frame());

        if battle.current_frame() % 250 == 0 {
            println!(
                "frame {:>5}: blue {:>4}  red {:>4}  rockets {:>4}  smoke {:>4}",
                battle.current_frame(),
                battle.active_tanks(Faction::Blue),
                battle.active_tanks(Faction::Red),
                battle.rocket_count(),
                battle.smoke_count(),
            );
        }
        if battle.config().max_frames.is_none() && battle.winner().is_some() {
            break;
        }
    }
    if battle.is_finished() {
        // No frame left to run; logs the end-of-battle line
        battle.run_frame();
    }

    let snapshot = battle.snapshot();
    for faction in [Faction::Blue, Faction::Red] {
        let sorted: Vec<i32> = snapshot
            .health_buckets(faction, 100)
            .into_iter()
            .flatten()
            .collect();
        let median = sorted.get(sorted.len() / 2).copied().unwrap_or(0);
        let left = snapshot.active_tanks(faction);
        println!("{faction:?}: {left} tanks left, median health {median}");
    }
    for beam in &snapshot.beams {
        println!(
            "beam at ({}, {}): {} tanks inside",
            beam.min_x, beam.min_y, beam.occupants
        );
    }

    println!("{}", profiler.report(Some(REF_PERFORMANCE)));
    profiler.log_summary(Some(REF_PERFORMANCE));
    Ok(())
}

//! Frame scheduler.
//!
//! A frame is a fixed graph of passes. Each pass is a [`FramePass`] system
//! set; the edges in [`FramePass::EDGES`] become `.before()` constraints on
//! one `bevy_ecs` schedule that is built once and re-run every frame.
//!
//! ```text
//! SpatialGrid ─► Tanks ─┬─► Rockets ─┬─► Explosions ─► ExplosionCompaction
//!                       │            ├─► Smoke ──────► SmokeCompaction
//!                       │            └─► RocketCompaction
//!                       └─► HazardZones
//! ```
//!
//! Passes with no path between them (HazardZones and Rockets, Explosions and
//! Smoke) may run concurrently on the multi-threaded executor. Entities
//! spawned through `Commands` in one pass are flushed at the sync point the
//! executor inserts before any pass ordered after it.

use crate::components::SpawnOrder;
use crate::spatial::spatial_grid_update_system;
use crate::systems::beam::hazard_zone_system;
use crate::systems::effects::{
    explosion_compaction_system, explosion_system, smoke_compaction_system, smoke_system,
};
use crate::systems::rocket::{rocket_compaction_system, rocket_pass_system};
use crate::systems::tank::tank_pass_system;
use bevy_ecs::prelude::*;

/// Number of frames simulated so far.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCount(pub u64);

impl FrameCount {
    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

/// Source of [`SpawnOrder`] numbers for rockets and effects.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnSequence(u64);

impl SpawnSequence {
    pub fn next(&mut self) -> SpawnOrder {
        let order = SpawnOrder(self.0);
        self.0 += 1;
        order
    }

    /// Number of orders handed out.
    pub fn issued(&self) -> u64 {
        self.0
    }
}

/// One pass of the frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePass {
    SpatialGrid,
    Tanks,
    Rockets,
    HazardZones,
    Smoke,
    Explosions,
    RocketCompaction,
    SmokeCompaction,
    ExplosionCompaction,
}

impl FramePass {
    pub const ALL: [FramePass; 9] = [
        FramePass::SpatialGrid,
        FramePass::Tanks,
        FramePass::Rockets,
        FramePass::HazardZones,
        FramePass::Smoke,
        FramePass::Explosions,
        FramePass::RocketCompaction,
        FramePass::SmokeCompaction,
        FramePass::ExplosionCompaction,
    ];

    /// Precedence edges `(before, after)`.
    pub const EDGES: [(FramePass, FramePass); 8] = [
        (FramePass::SpatialGrid, FramePass::Tanks),
        (FramePass::Tanks, FramePass::Rockets),
        (FramePass::Tanks, FramePass::HazardZones),
        (FramePass::Rockets, FramePass::Explosions),
        (FramePass::Rockets, FramePass::Smoke),
        (FramePass::Rockets, FramePass::RocketCompaction),
        (FramePass::Explosions, FramePass::ExplosionCompaction),
        (FramePass::Smoke, FramePass::SmokeCompaction),
    ];
}

/// Build the per-frame schedule.
pub fn build_frame_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    for (before, after) in FramePass::EDGES {
        schedule.configure_sets(before.before(after));
    }

    schedule.add_systems(spatial_grid_update_system.in_set(FramePass::SpatialGrid));
    schedule.add_systems(tank_pass_system.in_set(FramePass::Tanks));
    schedule.add_systems(rocket_pass_system.in_set(FramePass::Rockets));
    schedule.add_systems(hazard_zone_system.in_set(FramePass::HazardZones));
    schedule.add_systems(smoke_system.in_set(FramePass::Smoke));
    schedule.add_systems(explosion_system.in_set(FramePass::Explosions));
    schedule.add_systems(rocket_compaction_system.in_set(FramePass::RocketCompaction));
    schedule.add_systems(smoke_compaction_system.in_set(FramePass::SmokeCompaction));
    schedule.add_systems(explosion_compaction_system.in_set(FramePass::ExplosionCompaction));

    schedule
}

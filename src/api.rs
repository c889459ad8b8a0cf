//! Public API for the battle simulation.
//!
//! [`BattleWorld`] owns the ECS world and the frame schedule and is the only
//! thing a client (demo, renderer, benchmark) needs to touch.
//!
//! ## Fixed Timestep
//!
//! `run_frame()` advances exactly one frame. `step(dt)` accumulates wall
//! time and runs as many fixed frames as fit, so the battle plays out the
//! same regardless of the caller's frame rate. One call runs at most
//! `max_frames_per_step` frames; time past that is dropped rather than
//! carried into the next call.

use crate::components::*;
use crate::config::BattleConfig;
use crate::error::Result;
use crate::geometry::Rect;
use crate::scheduler::{build_frame_schedule, FrameCount, SpawnSequence};
use crate::spatial::SpatialGrid;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use glam::Vec2;
use tracing::{debug, info};

/// The main battle container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Setting up the two armies and the beams
/// - Stepping the battle forward
/// - Extracting state snapshots
pub struct BattleWorld {
    world: World,
    schedule: Schedule,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
    next_tank_id: u32,
    finished_logged: bool,
}

impl BattleWorld {
    /// Create an empty battle. Fails if the configuration is not runnable.
    pub fn new(config: BattleConfig) -> Result<Self> {
        config.validate()?;
        let grid = SpatialGrid::from_config(&config)?;

        let mut world = World::new();
        world.insert_resource(grid);
        world.insert_resource(FrameCount::default());
        world.insert_resource(SpawnSequence::default());
        world.insert_resource(config);

        Ok(Self {
            world,
            schedule: build_frame_schedule(),
            time: 0.0,
            time_accumulator: 0.0,
            next_tank_id: 0,
            finished_logged: false,
        })
    }

    /// Create the reference battle: both formations and every configured
    /// beam.
    pub fn with_default_battle(config: BattleConfig) -> Result<Self> {
        let mut battle = Self::new(config)?;
        let config = battle.config().clone();

        for (faction, side) in [(Faction::Blue, config.blue), (Faction::Red, config.red)] {
            let destination = Vec2::new(side.destination.0, side.destination.1);
            for i in 0..side.count {
                let col = (i % config.formation_columns) as f32;
                let row = (i / config.formation_columns) as f32;
                let position = Vec2::new(
                    side.start.0 + col * config.formation_spacing,
                    side.start.1 + row * config.formation_spacing,
                );
                battle.spawn_tank(faction, position, destination);
            }
        }

        for beam in &config.beams {
            let min = Vec2::new(beam.min.0, beam.min.1);
            let bounds = Rect::from_min_size(min, Vec2::new(beam.size.0, beam.size.1));
            battle.spawn_hazard_zone(bounds, config.beam_damage);
        }

        info!(
            blue = config.blue.count,
            red = config.red.count,
            beams = config.beams.len(),
            "battle created"
        );
        Ok(battle)
    }

    /// Spawn a tank and return its id. Ids are dense and never reused.
    pub fn spawn_tank(&mut self, faction: Faction, position: Vec2, destination: Vec2) -> TankId {
        let id = TankId(self.next_tank_id);
        self.next_tank_id += 1;
        let bundle = TankBundle::new(id, faction, position, destination, self.config());
        self.world.spawn(bundle);
        id
    }

    /// Spawn a particle beam.
    pub fn spawn_hazard_zone(&mut self, bounds: Rect, damage: i32) -> Entity {
        self.world.spawn(HazardZoneBundle::new(bounds, damage)).id()
    }

    /// Spawn a rocket outside the tank pass (scripted shots, tests).
    pub fn spawn_rocket(&mut self, faction: Faction, position: Vec2, velocity: Vec2) -> Entity {
        let radius = self.config().rocket_radius;
        let order = self.world.resource_mut::<SpawnSequence>().next();
        self.world
            .spawn(RocketBundle::new(order, faction, position, velocity, radius))
            .id()
    }

    /// Run exactly one frame of the battle. Does nothing once finished.
    pub fn run_frame(&mut self) {
        if self.is_finished() {
            if !self.finished_logged {
                self.finished_logged = true;
                info!(
                    frame = self.current_frame(),
                    blue = self.active_tanks(Faction::Blue),
                    red = self.active_tanks(Faction::Red),
                    "battle finished"
                );
            }
            return;
        }

        self.schedule.run(&mut self.world);
        self.world.resource_mut::<FrameCount>().increment();
        self.time += self.config().fixed_timestep;

        debug!(
            frame = self.current_frame(),
            rockets = self.rocket_count(),
            explosions = self.explosion_count(),
            smoke = self.smoke_count(),
            "frame complete"
        );
    }

    /// Advance by `dt` seconds of wall time using the fixed timestep.
    /// Returns the number of frames run.
    pub fn step(&mut self, dt: f32) -> u32 {
        let fixed_dt = self.config().fixed_timestep;
        let max_frames = self.config().max_frames_per_step;
        if dt.is_finite() && dt > 0.0 {
            self.time_accumulator += dt;
        }

        let mut frames = 0;
        while self.time_accumulator >= fixed_dt {
            if self.is_finished() {
                self.time_accumulator = 0.0;
                break;
            }
            if frames == max_frames {
                debug!(
                    dropped = self.time_accumulator,
                    "step frame cap reached, dropping leftover time"
                );
                self.time_accumulator = 0.0;
                break;
            }
            self.run_frame();
            self.time_accumulator -= fixed_dt;
            frames += 1;
        }
        frames
    }

    /// True once the frame count reached the configured limit.
    pub fn is_finished(&self) -> bool {
        self.config()
            .max_frames
            .is_some_and(|max| self.current_frame() >= max)
    }

    /// Get a snapshot of the current battle state.
    pub fn snapshot(&mut self) -> Snapshot {
        let frame = self.current_frame();
        Snapshot::from_world(&mut self.world, frame, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> Result<String> {
        self.snapshot().to_json()
    }

    pub fn current_frame(&self) -> u64 {
        self.world.resource::<FrameCount>().0
    }

    /// Elapsed simulation time in seconds.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &BattleConfig {
        self.world.resource::<BattleConfig>()
    }

    pub fn tank_count(&self) -> usize {
        self.next_tank_id as usize
    }

    /// Number of tanks of `faction` still in the fight.
    pub fn active_tanks(&mut self, faction: Faction) -> usize {
        let mut query = self.world.query_filtered::<(&Faction, &Active), With<Tank>>();
        query
            .iter(&self.world)
            .filter(|(f, active)| **f == faction && active.0)
            .count()
    }

    pub fn rocket_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<Entity, With<Rocket>>();
        query.iter(&self.world).count()
    }

    pub fn smoke_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<Entity, With<Smoke>>();
        query.iter(&self.world).count()
    }

    pub fn explosion_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<Entity, With<Explosion>>();
        query.iter(&self.world).count()
    }

    /// The faction with tanks left when the other has none.
    pub fn winner(&mut self) -> Option<Faction> {
        match (self.active_tanks(Faction::Blue), self.active_tanks(Faction::Red)) {
            (0, 0) => None,
            (_, 0) => Some(Faction::Blue),
            (0, _) => Some(Faction::Red),
            _ => None,
        }
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> &SpatialGrid {
        self.world.resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

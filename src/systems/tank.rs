//! Tank pass - collision nudging, beam damage, movement, reload and firing.
//!
//! ## Phases
//!
//! 1. **Gather** - every active tank is updated independently by
//!    [`update_tank`]. It reads only frame-stable data: its own state, the
//!    spatial grid (built from the same frame-start positions), the hazard
//!    zones and a targeting table. It returns a [`TankOutcome`].
//!    With the `parallel` feature this phase runs on rayon.
//!
//! 2. **Apply** - outcomes are written back in `TankId` order. Rockets and
//!    smoke are spawned here through `Commands`, so no lock is needed and
//!    spawn order is identical from run to run.

use crate::components::*;
use crate::config::BattleConfig;
use crate::scheduler::SpawnSequence;
use crate::spatial::SpatialGrid;
use crate::systems::targeting::{nearest_enemy, TargetCandidate};
use bevy_ecs::prelude::*;
use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// State of one tank at the start of the pass.
#[derive(Debug, Clone, Copy)]
pub struct TankFrameInput {
    pub entity: Entity,
    pub id: TankId,
    pub faction: Faction,
    pub position: Vec2,
    pub destination: Vec2,
    pub speed: f32,
    pub radius: f32,
    pub health: Health,
    pub reload: Reload,
    pub cell: Option<CellCoord>,
}

/// Read-only data shared by every tank update in a frame.
pub struct TankPassContext<'a> {
    pub config: &'a BattleConfig,
    pub grid: &'a SpatialGrid,
    pub hazards: &'a [HazardZone],
    pub targets: &'a [TargetCandidate],
}

/// Rocket requested by a tank this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocketLaunch {
    pub faction: Faction,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Result of updating one tank.
#[derive(Debug, Clone, Copy)]
pub struct TankOutcome {
    pub entity: Entity,
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: Health,
    pub reload: Reload,
    /// Position at which the tank was destroyed this frame.
    pub destroyed_at: Option<Vec2>,
    pub launch: Option<RocketLaunch>,
}

/// Sum of separation impulses from every overlapping neighbor in the grid.
///
/// Overlap is `distance² < (r1 + r2)²`. Each overlapping neighbor pushes
/// along the normalized vector pointing away from it with magnitude
/// `impulse`. Coincident tanks split along x: the lower id goes left.
pub fn collision_push(
    grid: &SpatialGrid,
    entity: Entity,
    id: TankId,
    position: Vec2,
    radius: f32,
    cell: CellCoord,
    impulse: f32,
) -> Vec2 {
    let mut push = Vec2::ZERO;
    for other in grid.units_near(cell) {
        if other.entity == entity {
            continue;
        }
        let away = position - other.position;
        let reach = radius + other.radius;
        if away.length_squared() >= reach * reach {
            continue;
        }
        let dir = away.normalize_or_zero();
        let dir = if dir == Vec2::ZERO {
            if id < other.id { Vec2::NEG_X } else { Vec2::X }
        } else {
            dir
        };
        push += dir * impulse;
    }
    push
}

/// Update a single tank for one frame.
pub fn update_tank(input: &TankFrameInput, ctx: &TankPassContext<'_>) -> TankOutcome {
    let config = ctx.config;
    let mut position = input.position;
    let mut health = input.health;
    let mut reload = input.reload;

    // 1. Collision resolution
    if let Some(cell) = input.cell {
        position += collision_push(
            ctx.grid,
            input.entity,
            input.id,
            input.position,
            input.radius,
            cell,
            config.collision_push,
        );
    }

    // 2. Beam damage
    for zone in ctx.hazards {
        if zone.affects(position, input.radius) && health.hit(zone.damage) {
            return TankOutcome {
                entity: input.entity,
                position,
                velocity: Vec2::ZERO,
                health,
                reload,
                destroyed_at: Some(position),
                launch: None,
            };
        }
    }

    // 3. Movement and reload
    let heading = (input.destination - position).normalize_or_zero();
    let velocity = heading * input.speed * config.movement_factor;
    position += velocity;
    reload.tick();

    // 4. Targeting and fire
    let mut launch = None;
    if reload.is_ready() {
        if let Some(target) = nearest_enemy(ctx.targets, position, input.faction) {
            let aim = (ctx.targets[target].position - position).normalize_or_zero();
            if aim != Vec2::ZERO {
                launch = Some(RocketLaunch {
                    faction: input.faction,
                    position,
                    velocity: aim * config.rocket_speed,
                });
                reload.reset(config.reload_frames);
            }
        }
    }

    TankOutcome {
        entity: input.entity,
        position,
        velocity,
        health,
        reload,
        destroyed_at: None,
        launch,
    }
}

/// System that runs the tank pass.
///
/// ## Data Access
/// - Reads: BattleConfig, SpatialGrid, HazardZone
/// - Writes: tank Position, Velocity, Health, Reload, Active; SpawnSequence
/// - Spawns: rockets, smoke
pub fn tank_pass_system(
    mut commands: Commands,
    config: Res<BattleConfig>,
    grid: Res<SpatialGrid>,
    mut sequence: ResMut<SpawnSequence>,
    zones: Query<&HazardZone>,
    mut tanks: Query<
        (
            Entity,
            &TankId,
            &Faction,
            &mut Position,
            &mut Velocity,
            &Destination,
            &Speed,
            &CollisionRadius,
            &mut Health,
            &mut Reload,
            &mut Active,
            &GridCell,
        ),
        With<Tank>,
    >,
) {
    let hazards: Vec<HazardZone> = zones.iter().copied().collect();

    // Frame-start table for targeting, indexed in TankId order.
    let mut all: Vec<_> = tanks
        .iter()
        .map(|(entity, id, faction, pos, _, dest, speed, radius, health, reload, active, cell)| {
            (
                TankFrameInput {
                    entity,
                    id: *id,
                    faction: *faction,
                    position: pos.0,
                    destination: dest.0,
                    speed: speed.0,
                    radius: radius.0,
                    health: *health,
                    reload: *reload,
                    cell: cell.0,
                },
                active.0,
            )
        })
        .collect();
    all.sort_unstable_by_key(|(input, _)| input.id);

    let targets: Vec<TargetCandidate> = all
        .iter()
        .map(|(input, active)| TargetCandidate {
            position: input.position,
            faction: input.faction,
            active: *active,
        })
        .collect();
    let inputs: Vec<TankFrameInput> = all
        .into_iter()
        .filter_map(|(input, active)| active.then_some(input))
        .collect();

    let ctx = TankPassContext {
        config: &config,
        grid: &grid,
        hazards: &hazards,
        targets: &targets,
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<TankOutcome> = inputs
        .par_iter()
        .map(|input| update_tank(input, &ctx))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<TankOutcome> = inputs.iter().map(|input| update_tank(input, &ctx)).collect();

    for outcome in outcomes {
        let Ok((_, _, _, mut pos, mut vel, _, _, _, mut health, mut reload, mut active, _)) =
            tanks.get_mut(outcome.entity)
        else {
            continue;
        };

        pos.0 = outcome.position;
        vel.0 = outcome.velocity;
        *health = outcome.health;
        *reload = outcome.reload;

        if let Some(at) = outcome.destroyed_at {
            active.0 = false;
            let plume = at - Vec2::new(0.0, config.smoke_offset);
            commands.spawn(SmokeBundle::new(sequence.next(), plume));
            continue;
        }

        if let Some(launch) = outcome.launch {
            commands.spawn(RocketBundle::new(
                sequence.next(),
                launch.faction,
                launch.position,
                launch.velocity,
                config.rocket_radius,
            ));
        }
    }
}

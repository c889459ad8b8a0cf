//! Rocket pass and rocket compaction.
//!
//! Same gather/apply split as the tank pass. The gather phase advances each
//! rocket and lists every enemy tank its circle touches, in grid scan order.
//! The apply phase walks rockets in `SpawnOrder` and damages the first
//! listed tank that is still active, so two rockets racing for the last hit
//! point on a tank resolve the same way on every run.

use crate::components::*;
use crate::config::BattleConfig;
use crate::geometry::circles_intersect;
use crate::scheduler::SpawnSequence;
use crate::spatial::SpatialGrid;
use bevy_ecs::prelude::*;
use glam::Vec2;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// State of one rocket at the start of the pass.
#[derive(Debug, Clone, Copy)]
pub struct RocketFrameInput {
    pub entity: Entity,
    pub order: SpawnOrder,
    pub faction: Faction,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

/// Current state of a tank as seen by rockets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankView {
    pub entity: Entity,
    pub id: TankId,
    pub faction: Faction,
    pub position: Vec2,
    pub radius: f32,
    pub active: bool,
}

/// Tank lookup by id, built once per rocket pass.
#[derive(Debug, Default)]
pub struct TankLookup {
    views: Vec<TankView>,
}

impl TankLookup {
    pub fn new(mut views: Vec<TankView>) -> Self {
        views.sort_unstable_by_key(|view| view.id);
        Self { views }
    }

    pub fn get(&self, id: TankId) -> Option<&TankView> {
        self.views
            .binary_search_by_key(&id, |view| view.id)
            .ok()
            .map(|index| &self.views[index])
    }
}

/// Result of advancing one rocket.
#[derive(Debug, Clone, PartialEq)]
pub struct RocketOutcome {
    pub entity: Entity,
    pub position: Vec2,
    pub out_of_bounds: bool,
    /// Enemy tanks touching the rocket, in scan order.
    pub candidates: Vec<Entity>,
}

/// True if `position` is further than `margin` outside the field.
pub fn outside_field(position: Vec2, config: &BattleConfig) -> bool {
    let margin = config.rocket_bounds_margin;
    position.x < -margin
        || position.y < -margin
        || position.x > config.field_width + margin
        || position.y > config.field_height + margin
}

/// Advance a rocket by one frame and collect the tanks it touches.
pub fn advance_rocket(
    input: &RocketFrameInput,
    grid: &SpatialGrid,
    tanks: &TankLookup,
    config: &BattleConfig,
) -> RocketOutcome {
    let position = input.position + input.velocity;

    if outside_field(position, config) {
        return RocketOutcome {
            entity: input.entity,
            position,
            out_of_bounds: true,
            candidates: Vec::new(),
        };
    }

    let cell = grid.home_cell(position);
    let candidates = grid
        .units_near(cell)
        .filter(|entry| entry.faction != input.faction)
        .filter_map(|entry| tanks.get(entry.id))
        .filter(|tank| {
            tank.active && circles_intersect(position, input.radius, tank.position, tank.radius)
        })
        .map(|tank| tank.entity)
        .collect();

    RocketOutcome {
        entity: input.entity,
        position,
        out_of_bounds: false,
        candidates,
    }
}

/// System that runs the rocket pass.
///
/// ## Data Access
/// - Reads: BattleConfig, SpatialGrid
/// - Writes: rocket Position, Active; tank Health, Active; SpawnSequence
/// - Spawns: explosions, smoke
pub fn rocket_pass_system(
    mut commands: Commands,
    config: Res<BattleConfig>,
    grid: Res<SpatialGrid>,
    mut sequence: ResMut<SpawnSequence>,
    mut rockets: Query<
        (Entity, &SpawnOrder, &Faction, &mut Position, &Velocity, &CollisionRadius, &mut Active),
        (With<Rocket>, Without<Tank>),
    >,
    mut tanks: Query<
        (Entity, &TankId, &Faction, &Position, &CollisionRadius, &mut Health, &mut Active),
        (With<Tank>, Without<Rocket>),
    >,
) {
    let lookup = TankLookup::new(
        tanks
            .iter()
            .map(|(entity, id, faction, pos, radius, _, active)| TankView {
                entity,
                id: *id,
                faction: *faction,
                position: pos.0,
                radius: radius.0,
                active: active.0,
            })
            .collect(),
    );

    let mut inputs: Vec<RocketFrameInput> = rockets
        .iter()
        .filter(|(.., active)| active.0)
        .map(|(entity, order, faction, pos, vel, radius, _)| RocketFrameInput {
            entity,
            order: *order,
            faction: *faction,
            position: pos.0,
            velocity: vel.0,
            radius: radius.0,
        })
        .collect();
    inputs.sort_unstable_by_key(|input| input.order);

    #[cfg(feature = "parallel")]
    let outcomes: Vec<RocketOutcome> = inputs
        .par_iter()
        .map(|input| advance_rocket(input, &grid, &lookup, &config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<RocketOutcome> = inputs
        .iter()
        .map(|input| advance_rocket(input, &grid, &lookup, &config))
        .collect();

    for outcome in outcomes {
        let Ok((_, order, _, mut pos, _, _, mut rocket_active)) = rockets.get_mut(outcome.entity)
        else {
            continue;
        };
        pos.0 = outcome.position;

        if outcome.out_of_bounds {
            trace!(rocket = order.0, "rocket left the field");
            rocket_active.0 = false;
            continue;
        }

        for target in outcome.candidates {
            let Ok((_, id, _, tank_pos, _, mut health, mut tank_active)) = tanks.get_mut(target)
            else {
                continue;
            };
            // Destroyed earlier in this frame by another rocket
            if !tank_active.0 {
                continue;
            }

            commands.spawn(ExplosionBundle::new(sequence.next(), tank_pos.0));
            if health.hit(config.rocket_hit_damage) {
                trace!(tank = id.0, "tank destroyed by rocket");
                tank_active.0 = false;
                commands.spawn(SmokeBundle::new(
                    sequence.next(),
                    tank_pos.0 - Vec2::new(0.0, config.smoke_offset),
                ));
            }
            rocket_active.0 = false;
            break;
        }
    }
}

/// System that despawns rockets deactivated during the frame.
pub fn rocket_compaction_system(
    mut commands: Commands,
    rockets: Query<(Entity, &Active), With<Rocket>>,
) {
    for (entity, active) in rockets.iter() {
        if !active.0 {
            commands.entity(entity).despawn();
        }
    }
}

//! Particle beam (hazard zone) pass.
//!
//! Beam damage is applied by the tank pass, one zone scan per tank, so a
//! tank never takes damage from the same beam twice in a frame. This pass
//! only animates the beams.

use crate::components::{Active, BeamAnimation, CollisionRadius, HazardZone, Position};
use crate::config::BattleConfig;
use bevy_ecs::prelude::*;

/// Advance every beam's cosmetic animation.
pub fn hazard_zone_system(
    config: Res<BattleConfig>,
    mut beams: Query<&mut BeamAnimation, With<HazardZone>>,
) {
    let period = config.beam_animation_period;
    for mut anim in beams.iter_mut() {
        anim.advance(period);
    }
}

/// Entities of the active tanks whose collision circle touches `zone`.
///
/// Takes any tank iterator, so it works on a system `Query` as well as on a
/// `QueryState` iterated over the whole world (snapshots).
pub fn tanks_inside<'a>(
    zone: &HazardZone,
    tanks: impl IntoIterator<Item = (Entity, &'a Position, &'a CollisionRadius, &'a Active)>,
) -> Vec<Entity> {
    tanks
        .into_iter()
        .filter(|(_, pos, radius, active)| active.0 && zone.affects(pos.0, radius.0))
        .map(|(entity, ..)| entity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Faction, HazardZoneBundle, Tank, TankBundle, TankId};
    use crate::geometry::Rect;
    use bevy_ecs::system::SystemState;
    use glam::Vec2;

    #[test]
    fn test_beam_animation_advances_and_wraps() {
        let mut world = World::new();
        world.insert_resource(BattleConfig::default());
        let bounds = Rect::from_min_size(Vec2::ZERO, Vec2::new(100.0, 50.0));
        let beam = world.spawn(HazardZoneBundle::new(bounds, 50)).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(hazard_zone_system);
        schedule.run(&mut world);
        assert_eq!(world.get::<BeamAnimation>(beam).unwrap().frame, 1);

        for _ in 0..29 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<BeamAnimation>(beam).unwrap().frame, 0);
    }

    #[test]
    fn test_tanks_inside_uses_circle_overlap() {
        let config = BattleConfig::default();
        let mut world = World::new();
        let bounds = Rect::from_min_size(Vec2::new(640.0, 360.0), Vec2::new(100.0, 50.0));
        let zone = HazardZone::new(bounds, 50);

        let mut spawn = |id: u32, x: f32, y: f32| {
            let pos = Vec2::new(x, y);
            world.spawn(TankBundle::new(TankId(id), Faction::Blue, pos, pos, &config)).id()
        };
        let center = spawn(0, 690.0, 385.0);
        let grazing = spawn(1, 630.0, 385.0);
        let outside = spawn(2, 627.0, 385.0);
        let dead = spawn(3, 700.0, 380.0);
        world.get_mut::<Active>(dead).unwrap().0 = false;

        let mut state: SystemState<
            Query<(Entity, &Position, &CollisionRadius, &Active), With<Tank>>,
        > = SystemState::new(&mut world);
        let query = state.get(&world);
        let mut inside = tanks_inside(&zone, &query);
        inside.sort();

        let mut expected = vec![center, grazing];
        expected.sort();
        assert_eq!(inside, expected);
        assert!(!inside.contains(&outside));
    }
}

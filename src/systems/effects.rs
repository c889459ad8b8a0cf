//! Smoke and explosion lifecycle.

use crate::components::{Explosion, ExplosionClock, Smoke, SmokeClock};
use crate::config::BattleConfig;
use bevy_ecs::prelude::*;

/// Advance every explosion by one frame.
pub fn explosion_system(
    config: Res<BattleConfig>,
    mut explosions: Query<&mut ExplosionClock, With<Explosion>>,
) {
    for mut clock in explosions.iter_mut() {
        clock.advance(config.explosion_frames);
    }
}

/// Advance every smoke plume by one frame.
pub fn smoke_system(config: Res<BattleConfig>, mut plumes: Query<&mut SmokeClock, With<Smoke>>) {
    for mut clock in plumes.iter_mut() {
        clock.advance(config.smoke_animation_period);
    }
}

/// Despawn explosions that played their last frame.
pub fn explosion_compaction_system(
    mut commands: Commands,
    config: Res<BattleConfig>,
    explosions: Query<(Entity, &ExplosionClock), With<Explosion>>,
) {
    for (entity, clock) in explosions.iter() {
        if clock.is_done(config.explosion_frames) {
            commands.entity(entity).despawn();
        }
    }
}

/// Despawn smoke plumes past their lifetime.
pub fn smoke_compaction_system(
    mut commands: Commands,
    config: Res<BattleConfig>,
    plumes: Query<(Entity, &SmokeClock), With<Smoke>>,
) {
    if config.smoke_lifetime.is_none() {
        return;
    }
    for (entity, clock) in plumes.iter() {
        if clock.is_done(config.smoke_lifetime) {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ExplosionBundle, SmokeBundle, SpawnOrder};
    use glam::Vec2;

    fn effects_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((
            (explosion_system, explosion_compaction_system).chain(),
            (smoke_system, smoke_compaction_system).chain(),
        ));
        schedule
    }

    #[test]
    fn test_explosion_lives_for_its_frame_count() {
        let mut world = World::new();
        world.insert_resource(BattleConfig::default());
        let boom = world.spawn(ExplosionBundle::new(SpawnOrder(0), Vec2::new(3.0, 0.0))).id();

        let mut schedule = effects_schedule();
        for frame in 1..=17 {
            schedule.run(&mut world);
            assert_eq!(world.get::<ExplosionClock>(boom).unwrap().frame, frame);
        }
        schedule.run(&mut world);
        assert!(world.get::<Explosion>(boom).is_none());
    }

    #[test]
    fn test_smoke_pruned_after_lifetime() {
        let mut world = World::new();
        world.insert_resource(BattleConfig {
            smoke_lifetime: Some(5),
            ..Default::default()
        });
        let plume = world.spawn(SmokeBundle::new(SpawnOrder(0), Vec2::ZERO)).id();

        let mut schedule = effects_schedule();
        for _ in 0..4 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<SmokeClock>(plume).unwrap().age, 4);
        schedule.run(&mut world);
        assert!(world.get::<Smoke>(plume).is_none());
    }

    #[test]
    fn test_smoke_without_lifetime_is_kept() {
        let mut world = World::new();
        world.insert_resource(BattleConfig {
            smoke_lifetime: None,
            ..Default::default()
        });
        let plume = world.spawn(SmokeBundle::new(SpawnOrder(0), Vec2::ZERO)).id();

        let mut schedule = effects_schedule();
        for _ in 0..300 {
            schedule.run(&mut world);
        }
        let clock = world.get::<SmokeClock>(plume).unwrap();
        assert_eq!(clock.age, 300);
        assert_eq!(clock.frame, 0);
    }
}

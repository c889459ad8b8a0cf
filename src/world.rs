//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable, render-ready view of the
//! battle. Every list is in a stable order (tanks by id, rockets and effects
//! by spawn order, beams by spawn) so two snapshots of equal worlds compare
//! equal.

use crate::components::*;
use crate::error::Result;
use crate::systems::beam::tanks_inside;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankSnapshot {
    pub id: u32,
    pub faction: Faction,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub health: i32,
    pub health_max: i32,
    pub reload: u32,
    pub active: bool,
}

/// Snapshot of a rocket in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketSnapshot {
    pub order: u64,
    pub faction: Faction,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

/// Snapshot of a smoke plume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmokeSnapshot {
    pub order: u64,
    pub x: f32,
    pub y: f32,
    pub frame: u32,
}

/// Snapshot of an explosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionSnapshot {
    pub order: u64,
    pub x: f32,
    pub y: f32,
    pub frame: u32,
}

/// Snapshot of a particle beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSnapshot {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
    pub damage: i32,
    pub frame: u32,
    /// Active tanks touching the beam when the snapshot was taken.
    #[serde(default)]
    pub occupants: u32,
}

/// Complete battle state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Frames simulated so far.
    pub frame: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub tanks: Vec<TankSnapshot>,
    pub rockets: Vec<RocketSnapshot>,
    pub smoke: Vec<SmokeSnapshot>,
    pub explosions: Vec<ExplosionSnapshot>,
    pub beams: Vec<BeamSnapshot>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, frame: u64, time: f32) -> Self {
        let mut tank_query = world.query_filtered::<(
            &TankId,
            &Faction,
            &Position,
            &Velocity,
            &CollisionRadius,
            &Health,
            &Reload,
            &Active,
        ), With<Tank>>();
        let mut tanks: Vec<TankSnapshot> = tank_query
            .iter(world)
            .map(|(id, faction, pos, vel, radius, health, reload, active)| TankSnapshot {
                id: id.0,
                faction: *faction,
                x: pos.0.x,
                y: pos.0.y,
                vx: vel.0.x,
                vy: vel.0.y,
                radius: radius.0,
                health: health.current,
                health_max: health.max,
                reload: reload.remaining,
                active: active.0,
            })
            .collect();
        tanks.sort_unstable_by_key(|t| t.id);

        let mut rocket_query = world.query_filtered::<(
            &SpawnOrder,
            &Faction,
            &Position,
            &Velocity,
            &CollisionRadius,
            &Active,
        ), With<Rocket>>();
        let mut rockets: Vec<RocketSnapshot> = rocket_query
            .iter(world)
            .filter(|(.., active)| active.0)
            .map(|(order, faction, pos, vel, radius, _)| RocketSnapshot {
                order: order.0,
                faction: *faction,
                x: pos.0.x,
                y: pos.0.y,
                vx: vel.0.x,
                vy: vel.0.y,
                radius: radius.0,
            })
            .collect();
        rockets.sort_unstable_by_key(|r| r.order);

        let mut smoke_query =
            world.query_filtered::<(&SpawnOrder, &Position, &SmokeClock), With<Smoke>>();
        let mut smoke: Vec<SmokeSnapshot> = smoke_query
            .iter(world)
            .map(|(order, pos, clock)| SmokeSnapshot {
                order: order.0,
                x: pos.0.x,
                y: pos.0.y,
                frame: clock.frame,
            })
            .collect();
        smoke.sort_unstable_by_key(|s| s.order);

        let mut explosion_query =
            world.query_filtered::<(&SpawnOrder, &Position, &ExplosionClock), With<Explosion>>();
        let mut explosions: Vec<ExplosionSnapshot> = explosion_query
            .iter(world)
            .map(|(order, pos, clock)| ExplosionSnapshot {
                order: order.0,
                x: pos.0.x,
                y: pos.0.y,
                frame: clock.frame,
            })
            .collect();
        explosions.sort_unstable_by_key(|e| e.order);

        let mut occupancy_query =
            world.query_filtered::<(Entity, &Position, &CollisionRadius, &Active), With<Tank>>();
        let mut beam_query = world.query::<(&HazardZone, &BeamAnimation)>();
        let mut beams = Vec::new();
        for (zone, anim) in beam_query.iter(world) {
            let occupants = tanks_inside(zone, occupancy_query.iter(world)).len();
            beams.push(BeamSnapshot {
                min_x: zone.bounds.min.x,
                min_y: zone.bounds.min.y,
                width: zone.bounds.width(),
                height: zone.bounds.height(),
                damage: zone.damage,
                frame: anim.frame,
                occupants: occupants as u32,
            });
        }

        Self {
            frame,
            time,
            tanks,
            rockets,
            smoke,
            explosions,
            beams,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Number of active tanks of a faction.
    pub fn active_tanks(&self, faction: Faction) -> usize {
        self.tanks.iter().filter(|t| t.active && t.faction == faction).count()
    }

    /// Health values of one faction, bucket-sorted for health-bar display.
    ///
    /// Bucket `i` holds the values in `[i * max / n, (i + 1) * max / n)`;
    /// full health lands in the last bucket. Values inside a bucket are
    /// ascending, so concatenating the buckets gives a sorted list.
    pub fn health_buckets(&self, faction: Faction, bucket_count: usize) -> Vec<Vec<i32>> {
        let mut buckets = vec![Vec::new(); bucket_count];
        if bucket_count == 0 {
            return buckets;
        }
        for tank in self.tanks.iter().filter(|t| t.faction == faction) {
            let max = tank.health_max.max(1) as i64;
            let health = tank.health.clamp(0, tank.health_max.max(0)) as i64;
            let last = bucket_count as i64 - 1;
            let index = ((health * bucket_count as i64) / max).min(last) as usize;
            buckets[index].push(tank.health);
        }
        for bucket in &mut buckets {
            bucket.sort_unstable();
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::error::SimError;
    use crate::geometry::Rect;
    use glam::Vec2;

    fn tank(id: u32, faction: Faction, health: i32) -> TankSnapshot {
        TankSnapshot {
            id,
            faction,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            radius: 12.0,
            health,
            health_max: 1000,
            reload: 0,
            active: health > 0,
        }
    }

    #[test]
    fn test_from_world_orders_entities() {
        let config = BattleConfig::default();
        let mut world = World::new();
        for id in [2, 0, 1] {
            let pos = Vec2::new(id as f32 * 10.0, 5.0);
            world.spawn(TankBundle::new(TankId(id), Faction::Red, pos, pos, &config));
        }
        world.spawn(RocketBundle::new(SpawnOrder(7), Faction::Blue, Vec2::ZERO, Vec2::X, 10.0));
        world.spawn(RocketBundle::new(SpawnOrder(3), Faction::Blue, Vec2::ZERO, Vec2::X, 10.0));
        world.spawn(SmokeBundle::new(SpawnOrder(5), Vec2::new(1.0, 2.0)));
        world.spawn(ExplosionBundle::new(SpawnOrder(4), Vec2::new(3.0, 4.0)));
        let bounds = Rect::from_min_size(Vec2::new(0.0, 0.0), Vec2::new(100.0, 50.0));
        world.spawn(HazardZoneBundle::new(bounds, 50));

        let snapshot = Snapshot::from_world(&mut world, 12, 0.2);

        let ids: Vec<u32> = snapshot.tanks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        let orders: Vec<u64> = snapshot.rockets.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![3, 7]);
        assert_eq!(snapshot.smoke.len(), 1);
        assert_eq!(snapshot.explosions[0].x, 3.0);
        assert_eq!(snapshot.beams[0].width, 100.0);
        // All three tanks sit at y = 5 inside the beam
        assert_eq!(snapshot.beams[0].occupants, 3);
        assert_eq!(snapshot.frame, 12);
        assert_eq!(snapshot.active_tanks(Faction::Red), 3);
    }

    #[test]
    fn test_json_roundtrip_keeps_everything() {
        let snapshot = Snapshot {
            frame: 42,
            time: 0.7,
            tanks: vec![tank(1, Faction::Blue, 940)],
            ..Default::default()
        };

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"Blue\""));
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = Snapshot::from_json("{\"frame\": \"soon\"}");
        assert!(matches!(result, Err(SimError::Serialization(_))));
    }

    #[test]
    fn test_health_buckets_sort_by_health() {
        let snapshot = Snapshot {
            tanks: vec![
                tank(0, Faction::Blue, 1000),
                tank(1, Faction::Blue, 455),
                tank(2, Faction::Blue, 0),
                tank(3, Faction::Blue, 450),
                tank(4, Faction::Red, 10),
            ],
            ..Default::default()
        };

        let buckets = snapshot.health_buckets(Faction::Blue, 10);
        assert_eq!(buckets.len(), 10);
        assert_eq!(buckets[0], vec![0]);
        assert_eq!(buckets[4], vec![450, 455]);
        assert_eq!(buckets[9], vec![1000]);

        let flat: Vec<i32> = buckets.into_iter().flatten().collect();
        assert_eq!(flat, vec![0, 450, 455, 1000]);
        assert!(snapshot.health_buckets(Faction::Red, 0).is_empty());
    }
}

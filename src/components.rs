//! ECS Components for the tank battle simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::config::BattleConfig;
use crate::geometry::Rect;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

// ============================================================================
// SHARED COMPONENTS
// ============================================================================

/// World position (x = right, y = down, matching screen space).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }
}

/// Displacement per frame.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

/// Radius of the circular collision proxy.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRadius(pub f32);

/// Side a tank or rocket belongs to.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Blue,
    Red,
}

impl Faction {
    pub fn opponent(self) -> Self {
        match self {
            Faction::Blue => Faction::Red,
            Faction::Red => Faction::Blue,
        }
    }
}

/// Whether the entity still takes part in the simulation.
///
/// Deactivation only flips this flag; the entity itself stays alive until
/// compaction (rockets) or forever (tanks), so a pass holding a stale
/// reference can always check it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Active(pub bool);

impl Default for Active {
    fn default() -> Self {
        Self(true)
    }
}

/// Monotonic spawn sequence number for rockets and effects.
/// Live collections are ordered by it.
#[derive(
    Component,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct SpawnOrder(pub u64);

// ============================================================================
// TANK COMPONENTS
// ============================================================================

/// Marker for tank entities.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Tank;

/// Dense tank index, assigned at spawn and never reused.
#[derive(
    Component,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct TankId(pub u32);

/// Point the tank drives toward.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Destination(pub Vec2);

/// Maximum movement speed.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed(pub f32);

/// Integer hit points, clamped to `0..=max`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Apply damage. Returns true only for the hit that destroys the tank.
    pub fn hit(&mut self, amount: i32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.current = (self.current - amount.max(0)).max(0);
        !self.is_alive()
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Frames left until the next rocket can be fired.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reload {
    pub remaining: u32,
}

impl Reload {
    pub fn new(remaining: u32) -> Self {
        Self { remaining }
    }

    /// Count one frame down, floored at zero.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    pub fn reset(&mut self, frames: u32) {
        self.remaining = frames;
    }
}

/// Grid cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Cell the tank is currently registered in (None = not in the grid).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell(pub Option<CellCoord>);

// ============================================================================
// ROCKET COMPONENTS
// ============================================================================

/// Marker for rocket entities.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Rocket;

// ============================================================================
// HAZARD ZONE COMPONENTS
// ============================================================================

/// Stationary particle beam that damages every tank touching its rectangle.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardZone {
    pub bounds: Rect,
    /// Damage applied per frame.
    pub damage: i32,
}

impl HazardZone {
    pub fn new(bounds: Rect, damage: i32) -> Self {
        Self { bounds, damage }
    }

    /// True if a collision circle touches the zone.
    #[inline]
    pub fn affects(&self, center: Vec2, radius: f32) -> bool {
        self.bounds.intersects_circle(center, radius)
    }
}

/// Cosmetic beam animation counter.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamAnimation {
    pub frame: u32,
}

impl BeamAnimation {
    pub fn advance(&mut self, period: u32) {
        self.frame += 1;
        if self.frame >= period {
            self.frame = 0;
        }
    }
}

// ============================================================================
// EFFECT COMPONENTS
// ============================================================================

/// Marker for smoke plumes.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Smoke;

/// Marker for explosions.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Explosion;

/// Smoke animation state. The visual frame wraps; `age` keeps counting so
/// the plume can be retired after a finite lifetime.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeClock {
    pub frame: u32,
    pub age: u32,
}

impl SmokeClock {
    pub fn advance(&mut self, period: u32) {
        self.age = self.age.saturating_add(1);
        self.frame += 1;
        if self.frame >= period {
            self.frame = 0;
        }
    }

    /// Smoke without a lifetime never finishes.
    pub fn is_done(&self, lifetime: Option<u32>) -> bool {
        lifetime.is_some_and(|limit| self.age >= limit)
    }
}

/// Explosion animation state; freezes on its last frame.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionClock {
    pub frame: u32,
}

impl ExplosionClock {
    pub fn advance(&mut self, total_frames: u32) {
        if self.frame < total_frames {
            self.frame += 1;
        }
    }

    /// Done once the counter has passed the last frame index.
    pub fn is_done(&self, total_frames: u32) -> bool {
        self.frame > total_frames.saturating_sub(1)
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a complete tank entity.
#[derive(Bundle)]
pub struct TankBundle {
    pub tank: Tank,
    pub id: TankId,
    pub faction: Faction,
    pub position: Position,
    pub velocity: Velocity,
    pub destination: Destination,
    pub speed: Speed,
    pub radius: CollisionRadius,
    pub health: Health,
    pub reload: Reload,
    pub active: Active,
    pub cell: GridCell,
}

impl TankBundle {
    pub fn new(
        id: TankId,
        faction: Faction,
        position: Vec2,
        destination: Vec2,
        config: &BattleConfig,
    ) -> Self {
        Self {
            tank: Tank,
            id,
            faction,
            position: Position(position),
            velocity: Velocity::default(),
            destination: Destination(destination),
            speed: Speed(config.tank_max_speed),
            radius: CollisionRadius(config.tank_radius),
            health: Health::new(config.tank_max_health),
            reload: Reload::new(config.initial_reload_frames),
            active: Active(true),
            cell: GridCell(None),
        }
    }
}

/// Bundle for spawning a rocket.
#[derive(Bundle)]
pub struct RocketBundle {
    pub rocket: Rocket,
    pub order: SpawnOrder,
    pub faction: Faction,
    pub position: Position,
    pub velocity: Velocity,
    pub radius: CollisionRadius,
    pub active: Active,
}

impl RocketBundle {
    pub fn new(
        order: SpawnOrder,
        faction: Faction,
        position: Vec2,
        velocity: Vec2,
        radius: f32,
    ) -> Self {
        Self {
            rocket: Rocket,
            order,
            faction,
            position: Position(position),
            velocity: Velocity(velocity),
            radius: CollisionRadius(radius),
            active: Active(true),
        }
    }
}

/// Bundle for spawning a particle beam.
#[derive(Bundle)]
pub struct HazardZoneBundle {
    pub zone: HazardZone,
    pub animation: BeamAnimation,
}

impl HazardZoneBundle {
    pub fn new(bounds: Rect, damage: i32) -> Self {
        Self {
            zone: HazardZone::new(bounds, damage),
            animation: BeamAnimation::default(),
        }
    }
}

/// Bundle for spawning a smoke plume.
#[derive(Bundle)]
pub struct SmokeBundle {
    pub smoke: Smoke,
    pub order: SpawnOrder,
    pub position: Position,
    pub clock: SmokeClock,
}

impl SmokeBundle {
    pub fn new(order: SpawnOrder, position: Vec2) -> Self {
        Self {
            smoke: Smoke,
            order,
            position: Position(position),
            clock: SmokeClock::default(),
        }
    }
}

/// Bundle for spawning an explosion.
#[derive(Bundle)]
pub struct ExplosionBundle {
    pub explosion: Explosion,
    pub order: SpawnOrder,
    pub position: Position,
    pub clock: ExplosionClock,
}

impl ExplosionBundle {
    pub fn new(order: SpawnOrder, position: Vec2) -> Self {
        Self {
            explosion: Explosion,
            order,
            position: Position(position),
            clock: ExplosionClock::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_and_reports_death_once() {
        let mut health = Health::new(100);
        assert!(!health.hit(60));
        assert_eq!(health.current, 40);
        assert!(health.hit(60));
        assert_eq!(health.current, 0);
        // Already destroyed: no second death, no negative health
        assert!(!health.hit(60));
        assert_eq!(health.current, 0);
    }

    #[test]
    fn test_negative_damage_never_heals() {
        let mut health = Health::new(100);
        health.hit(-50);
        assert_eq!(health.current, 100);
    }

    #[test]
    fn test_reload_floors_at_zero() {
        let mut reload = Reload::new(2);
        reload.tick();
        assert!(!reload.is_ready());
        reload.tick();
        reload.tick();
        assert!(reload.is_ready());
        assert_eq!(reload.remaining, 0);
    }

    #[test]
    fn test_explosion_freezes_and_finishes() {
        let mut clock = ExplosionClock::default();
        for _ in 0..17 {
            clock.advance(18);
        }
        assert!(!clock.is_done(18));
        clock.advance(18);
        assert!(clock.is_done(18));
        clock.advance(18);
        assert_eq!(clock.frame, 18);
    }

    #[test]
    fn test_smoke_wraps_but_ages() {
        let mut clock = SmokeClock::default();
        for _ in 0..60 {
            clock.advance(60);
        }
        assert_eq!(clock.frame, 0);
        assert_eq!(clock.age, 60);
        assert!(!clock.is_done(None));
        assert!(clock.is_done(Some(60)));
        assert!(!clock.is_done(Some(61)));
    }

    #[test]
    fn test_beam_animation_wraps() {
        let mut anim = BeamAnimation::default();
        for _ in 0..29 {
            anim.advance(30);
        }
        assert_eq!(anim.frame, 29);
        anim.advance(30);
        assert_eq!(anim.frame, 0);
    }
}

//! Battle configuration.
//!
//! All tuning constants live in [`BattleConfig`], which is inserted into the
//! ECS world as a resource. Defaults reproduce the reference battle: two
//! formations of 1279 tanks driving across a 1280x720 field past three
//! particle beams.
//!
//! Configurations can be loaded from RON:
//!
//! ```ron
//! (
//!     blue: (count: 20, start: (24.0, 98.0), destination: (1200.0, 600.0)),
//!     red: (count: 20, start: (980.0, 100.0), destination: (80.0, 80.0)),
//!     max_frames: Some(500),
//! )
//! ```
//!
//! Missing fields fall back to their defaults.

use crate::error::{Result, SimError};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Starting formation for one faction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideConfig {
    /// Number of tanks spawned for this side.
    pub count: u32,
    /// Position of the first tank in the formation.
    pub start: (f32, f32),
    /// Point every tank of this side drives toward.
    pub destination: (f32, f32),
}

/// A particle beam placed at battle start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamConfig {
    pub min: (f32, f32),
    pub size: (f32, f32),
}

/// Configuration for the battle simulation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Fixed timestep in seconds used by `BattleWorld::step`.
    pub fixed_timestep: f32,
    /// Most frames a single `BattleWorld::step` call may run; leftover
    /// time beyond that is dropped.
    pub max_frames_per_step: u32,
    /// Stop advancing after this many frames (None = run forever).
    pub max_frames: Option<u64>,

    /// Play field width in world units.
    pub field_width: f32,
    /// Play field height in world units.
    pub field_height: f32,
    /// Side length of one grid cell.
    pub grid_cell_size: f32,
    /// Number of grid cells along x.
    pub grid_size_x: u32,
    /// Number of grid cells along y.
    pub grid_size_y: u32,
    /// Neighborhood reach in cells (1 = 3x3).
    pub grid_reach: u32,

    pub tank_radius: f32,
    pub tank_max_health: i32,
    pub tank_max_speed: f32,
    /// Fraction of the max speed a tank covers each frame.
    pub movement_factor: f32,
    /// Frames between two rockets fired by the same tank.
    pub reload_frames: u32,
    /// Cooldown a freshly spawned tank starts with.
    pub initial_reload_frames: u32,
    /// Impulse applied per overlapping neighbor during collision resolution.
    pub collision_push: f32,

    pub rocket_radius: f32,
    pub rocket_speed: f32,
    pub rocket_hit_damage: i32,
    /// Rockets further than this outside the field are deactivated.
    pub rocket_bounds_margin: f32,

    pub beam_damage: i32,
    pub beam_animation_period: u32,

    /// Smoke is spawned this far above a destroyed tank.
    pub smoke_offset: f32,
    pub smoke_animation_period: u32,
    /// Frames a smoke plume lives (None = never pruned).
    pub smoke_lifetime: Option<u32>,
    /// Total explosion frames.
    pub explosion_frames: u32,

    /// Tanks per row in the starting formations.
    pub formation_columns: u32,
    pub formation_spacing: f32,
    pub blue: SideConfig,
    pub red: SideConfig,
    pub beams: Vec<BeamConfig>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_frames_per_step: 10,
            max_frames: Some(2000),

            field_width: 1280.0,
            field_height: 720.0,
            grid_cell_size: 26.0,
            grid_size_x: 50,
            grid_size_y: 28,
            grid_reach: 1,

            tank_radius: 12.0,
            tank_max_health: 1000,
            tank_max_speed: 1.5,
            movement_factor: 0.5,
            reload_frames: 200,
            initial_reload_frames: 1,
            collision_push: 1.0,

            rocket_radius: 10.0,
            rocket_speed: 3.0,
            rocket_hit_damage: 60,
            rocket_bounds_margin: 100.0,

            beam_damage: 50,
            beam_animation_period: 30,

            smoke_offset: 48.0,
            smoke_animation_period: 60,
            smoke_lifetime: Some(240),
            explosion_frames: 18,

            formation_columns: 12,
            formation_spacing: 15.0,
            blue: SideConfig {
                count: 1279,
                start: (24.0, 98.0),
                destination: (1200.0, 600.0),
            },
            red: SideConfig {
                count: 1279,
                start: (980.0, 100.0),
                destination: (80.0, 80.0),
            },
            beams: vec![
                BeamConfig {
                    min: (640.0, 360.0),
                    size: (100.0, 50.0),
                },
                BeamConfig {
                    min: (80.0, 80.0),
                    size: (100.0, 50.0),
                },
                BeamConfig {
                    min: (1200.0, 600.0),
                    size: (100.0, 50.0),
                },
            ],
        }
    }
}

impl BattleConfig {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Largest distance at which two entities can interact (tank/tank or
    /// rocket/tank).
    pub fn max_interaction_distance(&self) -> f32 {
        (self.tank_radius * 2.0).max(self.tank_radius + self.rocket_radius)
    }

    /// Check that the configuration describes a runnable battle.
    ///
    /// Called before the first frame; a failure here is the only fatal
    /// condition of the simulation.
    pub fn validate(&self) -> Result<()> {
        if !(self.grid_cell_size.is_finite() && self.grid_cell_size > 0.0) {
            return Err(SimError::InvalidGrid(format!(
                "cell size must be positive, got {}",
                self.grid_cell_size
            )));
        }
        if self.grid_size_x == 0 || self.grid_size_y == 0 {
            return Err(SimError::InvalidGrid(format!(
                "grid must have at least one cell, got {}x{}",
                self.grid_size_x, self.grid_size_y
            )));
        }
        if self.grid_reach == 0 {
            return Err(SimError::InvalidGrid("neighborhood reach must be at least 1".into()));
        }
        let covered_x = self.grid_size_x as f32 * self.grid_cell_size;
        let covered_y = self.grid_size_y as f32 * self.grid_cell_size;
        if covered_x < self.field_width || covered_y < self.field_height {
            return Err(SimError::InvalidGrid(format!(
                "{}x{} cells of {} cover {}x{}, field is {}x{}",
                self.grid_size_x,
                self.grid_size_y,
                self.grid_cell_size,
                covered_x,
                covered_y,
                self.field_width,
                self.field_height
            )));
        }
        let reach = self.grid_cell_size * self.grid_reach as f32;
        if reach < self.max_interaction_distance() {
            return Err(SimError::InvalidGrid(format!(
                "neighborhood reach {} is smaller than interaction distance {}",
                reach,
                self.max_interaction_distance()
            )));
        }
        if self.tank_radius <= 0.0 || self.rocket_radius <= 0.0 {
            return Err(SimError::InvalidConfig("collision radii must be positive".into()));
        }
        if self.tank_max_health <= 0 {
            return Err(SimError::InvalidConfig("tank max health must be positive".into()));
        }
        if self.rocket_hit_damage < 0 || self.beam_damage < 0 {
            return Err(SimError::InvalidConfig("damage values must not be negative".into()));
        }
        if self.explosion_frames == 0
            || self.beam_animation_period == 0
            || self.smoke_animation_period == 0
        {
            return Err(SimError::InvalidConfig("animation periods must be positive".into()));
        }
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(SimError::InvalidConfig("fixed timestep must be positive".into()));
        }
        if self.max_frames_per_step == 0 {
            return Err(SimError::InvalidConfig("max frames per step must be positive".into()));
        }
        if !(self.movement_factor.is_finite() && self.movement_factor >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "movement factor must not be negative, got {}",
                self.movement_factor
            )));
        }
        if self.formation_columns == 0 {
            return Err(SimError::InvalidConfig("formation needs at least one column".into()));
        }
        Ok(())
    }
}

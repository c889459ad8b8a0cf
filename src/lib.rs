//! Tank Battle - Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation of two tank armies
//! fighting across a field of particle beams.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod geometry;
pub mod profiler;
pub mod render;
pub mod scheduler;
pub mod spatial;
pub mod systems;
pub mod world;

pub use api::BattleWorld;
pub use components::*;
pub use config::{BattleConfig, BeamConfig, SideConfig};
pub use error::{Result, SimError};
pub use geometry::{circles_intersect, Rect};
pub use profiler::FrameProfiler;
pub use render::{
    render_snapshot, AssetLoader, Drawable, Renderer, SpriteKind, SpriteRect, TextureHandle,
    TextureSet,
};
pub use scheduler::{build_frame_schedule, FrameCount, FramePass, SpawnSequence};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use systems::*;
pub use world::Snapshot;

//! ECS systems for the tank battle.
//!
//! Systems contain the battle logic that operates on components.
//!
//! ## Passes
//!
//! One frame runs these passes, ordered by [`crate::scheduler::FramePass`]:
//!
//! **Spatial grid** - `spatial_grid_update_system` rebuilds the grid from
//! active tanks.
//!
//! **Tanks** - `tank_pass_system`: collision nudging, beam damage, movement,
//! reload, nearest-enemy targeting and rocket launch.
//!
//! **Rockets** - `rocket_pass_system`: flight, bounds check, hits on enemy
//! tanks. Runs alongside the beam pass.
//!
//! **Hazard zones** - `hazard_zone_system`: beam animation.
//!
//! **Effects** - `smoke_system`, `explosion_system`.
//!
//! **Compaction** - `rocket_compaction_system`, `smoke_compaction_system`,
//! `explosion_compaction_system` despawn finished entities.
//!
//! The tank and rocket passes gather per-entity outcomes in parallel and
//! apply them serially, so their results do not depend on thread count.

pub mod beam;
pub mod effects;
pub mod rocket;
pub mod tank;
pub mod targeting;

pub use beam::*;
pub use effects::*;
pub use rocket::*;
pub use tank::*;
pub use targeting::*;

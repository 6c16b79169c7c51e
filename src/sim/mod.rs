//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod dilation;
pub mod shapes;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Judgement, judge};
pub use dilation::{Dilation, GravityBody, Influence, time_multiplier, world_multiplier};
pub use shapes::{Circle, Rect, Shape};
pub use spawner::{SpawnTimer, Spawner};
pub use state::{
    EndReason, Entity, EntityClass, EntityId, EntityKind, EntityView, GameEvent, GameOver, Gate,
    GravityObstacle, Player, RandomObstacle, Snapshot, Status, World,
};
pub use tick::{Direction, TickInput, tick};

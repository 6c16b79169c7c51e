//! Time dilation
//!
//! Each tick the player's distance to every gravity obstacle surface sets a
//! scalar multiplier for all non-player motion and for spawn cadence:
//!
//! - surface distance `d = |player - center| - radius`
//! - obstacles with `d < min_distance` vote `d / dividing_factor`
//! - raw multiplier is the smallest vote, capped at 1.0 (no votes = 1.0)
//! - raw multiplier is floored at `min_change_percent` (overlap can make a
//!   vote negative; it is lifted, never amplified)
//! - multiplier = raw * game_speed

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, World};
use crate::config::Tuning;
use crate::point_distance;

/// The gravity obstacle whose vote set the multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Influence {
    pub id: EntityId,
    /// Size tier of the obstacle (informational only)
    pub delta_t: u8,
    /// Surface distance to the player (negative when overlapping)
    pub distance: f32,
}

/// Result of one dilation computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dilation {
    /// Raw multiplier after the floor, before game speed
    pub raw: f32,
    /// Final multiplier (raw * game_speed)
    pub multiplier: f32,
    pub dominant: Option<Influence>,
}

/// One gravity body as the engine sees it
#[derive(Debug, Clone, Copy)]
pub struct GravityBody {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    pub delta_t: u8,
}

/// Surface distance between the player center and a gravity body
#[inline]
pub fn surface_distance(player_center: Vec2, body: &GravityBody) -> f32 {
    point_distance(player_center, body.center) - body.radius
}

/// This body's vote, or `None` when it is out of range
pub fn vote(player_center: Vec2, body: &GravityBody, tuning: &Tuning) -> Option<(f32, f32)> {
    let dist = surface_distance(player_center, body);
    if dist < tuning.min_distance {
        Some((dist, dist / tuning.dividing_factor))
    } else {
        None
    }
}

/// Compute the multiplier for a set of gravity bodies
pub fn time_multiplier<I>(player_center: Vec2, bodies: I, tuning: &Tuning, game_speed: f32) -> Dilation
where
    I: IntoIterator<Item = GravityBody>,
{
    let mut raw = 1.0f32;
    let mut dominant = None;

    for body in bodies {
        let Some((distance, candidate)) = vote(player_center, &body, tuning) else {
            continue;
        };
        if candidate < raw {
            raw = candidate;
            dominant = Some(Influence {
                id: body.id,
                delta_t: body.delta_t,
                distance,
            });
        }
    }

    if raw < tuning.min_change_percent {
        raw = tuning.min_change_percent;
    }

    let multiplier = raw * game_speed;
    debug_assert!(multiplier.is_finite() && multiplier > 0.0);

    Dilation {
        raw,
        multiplier,
        dominant,
    }
}

/// Dilation for the world's current positions
pub fn world_multiplier(world: &World) -> Dilation {
    let bodies = world.gravity_obstacles().map(|(e, g)| GravityBody {
        id: e.id,
        center: e.center(),
        radius: g.radius(),
        delta_t: g.delta_t,
    });
    time_multiplier(world.player.center(), bodies, &world.tuning, world.game_speed)
}

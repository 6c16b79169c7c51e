//! Relative Space - a vertical-scroll arcade simulation with local time dilation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, dilation, spawning, collisions)
//! - `config`: Tunable constants with validation
//! - `error`: Configuration errors
//!
//! Rendering, audio, asset loading and input polling live outside this crate.
//! The core consumes a per-tick [`sim::TickInput`] and exposes a
//! [`sim::Snapshot`] plus [`sim::GameEvent`]s each step.

pub mod config;
pub mod error;
pub mod sim;

pub use config::{SpeedRamp, Tuning};
pub use error::ConfigError;

use glam::Vec2;

/// Default game constants (overridable through [`Tuning`])
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const TICK_MS: f64 = 1000.0 / 60.0;

    /// Play field dimensions
    pub const FIELD_WIDTH: f32 = 700.0;
    pub const FIELD_HEIGHT: f32 = 1000.0;

    /// Overall game speed and its periodic ramp
    pub const GAME_SPEED: f32 = 0.75;
    pub const SPEED_INCREASE: f32 = 0.01;
    pub const SPEED_RAMP_INTERVAL_MS: f64 = 100.0;

    /// Base velocities (units per tick at multiplier 1.0)
    pub const GATE_VELOCITY: f32 = 5.0;
    pub const GRAVITY_OBSTACLE_VELOCITY: f32 = 8.0;
    pub const RANDOM_OBSTACLE_VELOCITY: f32 = 11.0;
    pub const PLAYER_SPEED: f32 = 5.5;

    /// Base spawn intervals
    pub const GATE_SPAWN_MS: f64 = 2500.0;
    pub const GRAVITY_OBSTACLE_SPAWN_MS: f64 = 900.0;
    pub const RANDOM_OBSTACLE_SPAWN_MS: f64 = 500.0;

    /// Time dilation
    pub const MIN_DISTANCE: f32 = 250.0;
    pub const DIVIDING_FACTOR: f32 = 100.0;
    pub const MIN_CHANGE_PERCENT: f32 = 0.25;

    /// Entity dimensions
    pub const GRAVITY_SIZE_TIERS: [f32; 3] = [150.0, 175.0, 200.0];
    pub const RANDOM_OBSTACLE_SIZE: f32 = 15.0;
    pub const GATE_WIDTH: f32 = 50.0;
    pub const GATE_HEIGHT: f32 = 7.5;
    pub const PLAYER_WIDTH: f32 = 10.0;
    pub const PLAYER_HEIGHT: f32 = 25.0;

    /// Score projection: one point per divisor, plus a bonus per gate
    pub const SCORE_DIVISOR_MS: f64 = 500.0;
    pub const GATE_SCORE_WEIGHT: u64 = 50;

    /// Inset kept between the player and every field edge
    pub const PLAYER_EDGE_INSET: f32 = 1.0;

    /// Random obstacles spawn on the lateral edges, this far from top/bottom
    pub const RANDOM_SPAWN_MARGIN: i32 = 50;
    /// Vertical grid step of random obstacle spawn points
    pub const RANDOM_SPAWN_STEP: i32 = 10;
    /// Per-axis weight range used to randomize random obstacle direction
    pub const RANDOM_DIRECTION_WEIGHT: std::ops::Range<i32> = 2..15;

    /// Per-key movement vector magnitude (only the direction survives normalization)
    pub const MOVE_STEP: f32 = 0.1;
}

/// Unit vector in the direction of `v`, or `v` unchanged when it has zero length
#[inline]
pub fn normalize_or_unchanged(v: Vec2) -> Vec2 {
    let len = v.length();
    if len > 0.0 { v / len } else { v }
}

/// Normalize in place; zero-length vectors are left alone
#[inline]
pub fn normalize_in_place(v: &mut Vec2) {
    *v = normalize_or_unchanged(*v);
}

/// Euclidean distance between two points
#[inline]
pub fn point_distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_zero_is_noop() {
        assert_eq!(normalize_or_unchanged(Vec2::ZERO), Vec2::ZERO);

        let mut v = Vec2::ZERO;
        normalize_in_place(&mut v);
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn test_normalize_diagonal() {
        let v = normalize_or_unchanged(Vec2::new(0.1, -0.1));
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(v.x > 0.0 && v.y < 0.0);
        assert!((v.x + v.y).abs() < 1e-6);
    }

    #[test]
    fn test_point_distance() {
        assert_eq!(point_distance(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0)), 5.0);
        assert_eq!(point_distance(Vec2::new(2.0, 2.0), Vec2::new(2.0, 2.0)), 0.0);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_unit_and_keeps_direction(x in -1000.0f32..1000.0, y in -1000.0f32..1000.0) {
            let v = Vec2::new(x, y);
            prop_assume!(v.length() > 1e-3);
            let n = normalize_or_unchanged(v);
            prop_assert!((n.length() - 1.0).abs() < 1e-4);
            // Same direction: parallel and pointing the same way
            prop_assert!(n.dot(v) > 0.0);
            prop_assert!(n.perp_dot(v).abs() / v.length() < 1e-3);
        }

        #[test]
        fn prop_distance_symmetric_non_negative(
            ax in -1e4f32..1e4, ay in -1e4f32..1e4, bx in -1e4f32..1e4, by in -1e4f32..1e4,
        ) {
            let a = Vec2::new(ax, ay);
            let b = Vec2::new(bx, by);
            let d = point_distance(a, b);
            prop_assert!(d >= 0.0);
            prop_assert_eq!(d, point_distance(b, a));
            prop_assert_eq!(point_distance(a, a), 0.0);
        }
    }
}

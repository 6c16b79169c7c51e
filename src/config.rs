//! Tunable game constants
//!
//! Every constant the simulation reads lives in [`Tuning`]. Defaults match
//! the standard arcade balance; any subset can be overridden from JSON.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// How the speed-ramp threshold advances after each increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeedRamp {
    /// Threshold doubles each time (ramps get rarer as the run goes on)
    #[default]
    Doubling,
    /// Threshold advances by the configured interval (steady ramp)
    Fixed,
}

impl SpeedRamp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedRamp::Doubling => "doubling",
            SpeedRamp::Fixed => "fixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "doubling" | "double" => Some(SpeedRamp::Doubling),
            "fixed" => Some(SpeedRamp::Fixed),
            _ => None,
        }
    }

    /// Next threshold after a ramp fired at `threshold`
    pub fn advance(&self, threshold: f64, interval: f64) -> f64 {
        match self {
            SpeedRamp::Doubling => threshold + threshold,
            SpeedRamp::Fixed => threshold + interval,
        }
    }
}

/// Game balance constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,
    /// Fixed step length in milliseconds
    pub tick_ms: f64,

    // === Global speed ===
    /// Starting game speed (multiplies every dilation value)
    pub game_speed: f32,
    /// Added to game speed each time the ramp fires
    pub speed_increase: f32,
    /// First ramp threshold (and step for [`SpeedRamp::Fixed`])
    pub speed_ramp_interval_ms: f64,
    pub speed_ramp: SpeedRamp,

    // === Velocities ===
    pub gate_velocity: f32,
    pub gravity_velocity: f32,
    pub random_velocity: f32,
    pub player_speed: f32,

    // === Spawning ===
    pub gate_spawn_ms: f64,
    pub gravity_spawn_ms: f64,
    pub random_spawn_ms: f64,

    // === Time dilation ===
    /// Surface distance under which a gravity obstacle slows time
    pub min_distance: f32,
    /// Surface distance that maps to multiplier 1.0
    pub dividing_factor: f32,
    /// Floor of the raw multiplier
    pub min_change_percent: f32,

    // === Dimensions ===
    pub gravity_size_tiers: Vec<f32>,
    pub random_obstacle_size: f32,
    pub gate_width: f32,
    pub gate_height: f32,
    pub player_width: f32,
    pub player_height: f32,

    // === Score ===
    pub score_divisor_ms: f64,
    pub gate_score_weight: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            tick_ms: TICK_MS,

            game_speed: GAME_SPEED,
            speed_increase: SPEED_INCREASE,
            speed_ramp_interval_ms: SPEED_RAMP_INTERVAL_MS,
            speed_ramp: SpeedRamp::Doubling,

            gate_velocity: GATE_VELOCITY,
            gravity_velocity: GRAVITY_OBSTACLE_VELOCITY,
            random_velocity: RANDOM_OBSTACLE_VELOCITY,
            player_speed: PLAYER_SPEED,

            gate_spawn_ms: GATE_SPAWN_MS,
            gravity_spawn_ms: GRAVITY_OBSTACLE_SPAWN_MS,
            random_spawn_ms: RANDOM_OBSTACLE_SPAWN_MS,

            min_distance: MIN_DISTANCE,
            dividing_factor: DIVIDING_FACTOR,
            min_change_percent: MIN_CHANGE_PERCENT,

            gravity_size_tiers: GRAVITY_SIZE_TIERS.to_vec(),
            random_obstacle_size: RANDOM_OBSTACLE_SIZE,
            gate_width: GATE_WIDTH,
            gate_height: GATE_HEIGHT,
            player_width: PLAYER_WIDTH,
            player_height: PLAYER_HEIGHT,

            score_divisor_ms: SCORE_DIVISOR_MS,
            gate_score_weight: GATE_SCORE_WEIGHT,
        }
    }
}

fn positive_f32(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn positive_f64(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every constant the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_f32("field_width", self.field_width)?;
        positive_f32("field_height", self.field_height)?;
        positive_f64("tick_ms", self.tick_ms)?;

        positive_f32("player_width", self.player_width)?;
        positive_f32("player_height", self.player_height)?;
        let inset = 2.0 * PLAYER_EDGE_INSET;
        if self.player_width + inset > self.field_width {
            return Err(ConfigError::invalid(
                "player_width",
                "player does not fit the field width",
            ));
        }
        if self.player_height + inset > self.field_height {
            return Err(ConfigError::invalid(
                "player_height",
                "player does not fit the field height",
            ));
        }

        positive_f32("game_speed", self.game_speed)?;
        if !(self.speed_increase.is_finite() && self.speed_increase >= 0.0) {
            return Err(ConfigError::invalid(
                "speed_increase",
                "game speed may never decrease",
            ));
        }
        positive_f64("speed_ramp_interval_ms", self.speed_ramp_interval_ms)?;

        positive_f32("gate_velocity", self.gate_velocity)?;
        positive_f32("gravity_velocity", self.gravity_velocity)?;
        positive_f32("random_velocity", self.random_velocity)?;
        positive_f32("player_speed", self.player_speed)?;

        positive_f64("gate_spawn_ms", self.gate_spawn_ms)?;
        positive_f64("gravity_spawn_ms", self.gravity_spawn_ms)?;
        positive_f64("random_spawn_ms", self.random_spawn_ms)?;

        positive_f32("min_distance", self.min_distance)?;
        positive_f32("dividing_factor", self.dividing_factor)?;
        if !(self.min_change_percent > 0.0 && self.min_change_percent <= 1.0) {
            return Err(ConfigError::invalid(
                "min_change_percent",
                format!("must be in (0, 1], got {}", self.min_change_percent),
            ));
        }

        if self.gravity_size_tiers.is_empty() {
            return Err(ConfigError::invalid("gravity_size_tiers", "no size tiers"));
        }
        if self.gravity_size_tiers.len() > u8::MAX as usize {
            return Err(ConfigError::invalid("gravity_size_tiers", "too many size tiers"));
        }
        for &size in &self.gravity_size_tiers {
            positive_f32("gravity_size_tiers", size)?;
            // Spawn x is drawn from [0, width - floor(size / 2))
            if ((self.field_width - (size / 2.0).floor()) as i32) < 1 {
                return Err(ConfigError::invalid(
                    "gravity_size_tiers",
                    format!("size {size} leaves no spawn range"),
                ));
            }
        }

        positive_f32("random_obstacle_size", self.random_obstacle_size)?;
        if self.random_obstacle_size >= self.field_width {
            return Err(ConfigError::invalid(
                "random_obstacle_size",
                "random obstacle does not fit the field",
            ));
        }
        positive_f32("gate_width", self.gate_width)?;
        positive_f32("gate_height", self.gate_height)?;
        if (self.field_width - self.gate_width).floor() < 1.0 {
            return Err(ConfigError::invalid("gate_width", "gate does not fit the field"));
        }
        if (self.field_height as i32) - 2 * RANDOM_SPAWN_MARGIN <= 0 {
            return Err(ConfigError::invalid(
                "field_height",
                "no room for random obstacle spawn band",
            ));
        }

        positive_f64("score_divisor_ms", self.score_divisor_ms)?;

        Ok(())
    }

    /// Size of the player rectangle
    pub fn player_size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.player_width, self.player_height)
    }

    /// Size of a gate rectangle
    pub fn gate_size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.gate_width, self.gate_height)
    }
}

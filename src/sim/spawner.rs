//! Spawn timers and entity factories
//!
//! Three independent timer lines (gates, gravity obstacles, random
//! obstacles). Each keeps its base interval separate from the live
//! effective interval and the absolute due time.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{
    Entity, EntityClass, EntityKind, Gate, GravityObstacle, RandomObstacle, World,
};
use crate::config::Tuning;
use crate::consts::{RANDOM_DIRECTION_WEIGHT, RANDOM_SPAWN_MARGIN, RANDOM_SPAWN_STEP};
use crate::normalize_or_unchanged;

/// One spawn timer line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    /// Interval at multiplier 1.0 (ms)
    pub base_interval: f64,
    /// Interval after dilation (ms)
    pub effective_interval: f64,
    /// Absolute elapsed time after which the next instance appears (ms)
    pub next_due: f64,
}

impl SpawnTimer {
    pub fn new(base_interval: f64) -> Self {
        Self {
            base_interval,
            effective_interval: base_interval,
            next_due: base_interval,
        }
    }

    /// Fire if `now` is past the due time, rearming from `now`
    pub fn poll(&mut self, now: f64) -> bool {
        if now > self.next_due {
            self.next_due = now + self.effective_interval;
            true
        } else {
            false
        }
    }

    /// Slower time spawns less often: interval = base / multiplier
    pub fn rescale(&mut self, multiplier: f32) {
        let interval = self.base_interval / multiplier as f64;
        assert!(
            interval.is_finite(),
            "non-finite spawn interval (multiplier {multiplier})"
        );
        self.effective_interval = interval;
    }
}

/// Timers for every spawnable kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub gate: SpawnTimer,
    pub gravity: SpawnTimer,
    pub random: SpawnTimer,
}

impl Spawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            gate: SpawnTimer::new(tuning.gate_spawn_ms),
            gravity: SpawnTimer::new(tuning.gravity_spawn_ms),
            random: SpawnTimer::new(tuning.random_spawn_ms),
        }
    }

    /// Kinds due at `now`, in spawn order
    pub fn poll(&mut self, now: f64) -> Vec<EntityClass> {
        let mut due = Vec::with_capacity(3);
        if self.gate.poll(now) {
            due.push(EntityClass::Gate);
        }
        if self.gravity.poll(now) {
            due.push(EntityClass::GravityObstacle);
        }
        if self.random.poll(now) {
            due.push(EntityClass::RandomObstacle);
        }
        due
    }

    /// Apply this tick's multiplier to every line (used from the next poll)
    pub fn rescale(&mut self, multiplier: f32) {
        self.gate.rescale(multiplier);
        self.gravity.rescale(multiplier);
        self.random.rescale(multiplier);
    }
}

/// Gravity obstacle entering from the top edge at a random lateral offset
pub fn make_gravity_obstacle<R: Rng>(rng: &mut R, tuning: &Tuning) -> (Vec2, EntityKind) {
    let tier = rng.random_range(0..tuning.gravity_size_tiers.len());
    let size = tuning.gravity_size_tiers[tier];
    // Half the diameter is truncated before subtracting
    let span = (tuning.field_width - (size / 2.0).floor()) as i32;
    let x = rng.random_range(0..span) as f32;

    (
        Vec2::new(x, -size),
        EntityKind::Gravity(GravityObstacle {
            size,
            delta_t: tier as u8,
        }),
    )
}

/// Gate entering from the top edge at a random lateral offset
pub fn make_gate<R: Rng>(rng: &mut R, tuning: &Tuning) -> (Vec2, EntityKind) {
    let span = (tuning.field_width - tuning.gate_width).floor() as i32;
    let x = rng.random_range(0..span) as f32;

    (
        Vec2::new(x, -tuning.gate_height),
        EntityKind::Gate(Gate {
            size: tuning.gate_size(),
        }),
    )
}

/// Random obstacle entering from a lateral edge, heading inward
pub fn make_random_obstacle<R: Rng>(rng: &mut R, tuning: &Tuning) -> (Vec2, EntityKind) {
    let size = tuning.random_obstacle_size;
    let from_left = rng.random_bool(0.5);
    let x = if from_left { -size } else { tuning.field_width };

    let rows = (tuning.field_height as i32 - 2 * RANDOM_SPAWN_MARGIN + RANDOM_SPAWN_STEP - 1)
        / RANDOM_SPAWN_STEP;
    let y = (RANDOM_SPAWN_MARGIN + rng.random_range(0..rows) * RANDOM_SPAWN_STEP) as f32;

    let pos = Vec2::new(x, y);
    let base_vel = random_velocity(rng, pos, tuning);

    (pos, EntityKind::Random(RandomObstacle { size, base_vel }))
}

/// Random direction whose horizontal sign points away from the spawn edge,
/// normalized and scaled to the fixed random obstacle speed
pub fn random_velocity<R: Rng>(rng: &mut R, pos: Vec2, tuning: &Tuning) -> Vec2 {
    let direction = if pos.x > 1.0 { -1.0 } else { 1.0 };
    let vx = rng.random_range(RANDOM_DIRECTION_WEIGHT) as f32 * direction;
    let vy = rng.random_range(RANDOM_DIRECTION_WEIGHT) as f32 * rng.random_range(-1..=1) as f32;

    normalize_or_unchanged(Vec2::new(vx, vy)) * tuning.random_velocity
}

/// Build and insert one entity of `class`
pub fn spawn(world: &mut World, class: EntityClass) -> Option<Entity> {
    let (pos, kind) = {
        let (tuning, rng) = world.tuning_and_rng();
        match class {
            EntityClass::Gate => make_gate(rng, tuning),
            EntityClass::GravityObstacle => make_gravity_obstacle(rng, tuning),
            EntityClass::RandomObstacle => make_random_obstacle(rng, tuning),
            EntityClass::Player => return None,
        }
    };

    let id = world.next_entity_id();
    let entity = Entity::new(id, pos, kind);
    log::debug!(
        "Spawned {:?} #{} at ({:.0}, {:.0})",
        class,
        id,
        pos.x,
        pos.y
    );
    world.insert(entity.clone());
    Some(entity)
}

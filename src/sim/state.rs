//! World state and core simulation types
//!
//! The [`World`] owns every piece of mutable state: the player, one
//! id-ordered entity store, spawn timers, counters and the RNG. Views by
//! kind (gravity obstacles, all obstacles, gates) are derived from the store.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::dilation::Influence;
use super::shapes::{Circle, Rect, Shape};
use super::spawner::Spawner;
use crate::config::Tuning;
use crate::consts::PLAYER_EDGE_INSET;
use crate::error::ConfigError;

/// Entity identifier, unique within a session and never reused
pub type EntityId = u32;

/// Entity classes as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Player,
    GravityObstacle,
    RandomObstacle,
    Gate,
}

/// The user-controlled body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Distance moved per tick at full input
    pub speed: f32,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        let start = (tuning.field_width / 2.0).floor();
        let mut player = Self {
            pos: Vec2::splat(start),
            size: tuning.player_size(),
            speed: tuning.player_speed,
        };
        player.clamp_to_field(Vec2::new(tuning.field_width, tuning.field_height));
        player
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    /// The player sprite is a filled rectangle
    pub fn shape(&self) -> Shape {
        Shape::Rect(self.bounds())
    }

    /// Move by the normalized intent (never time-dilated), then clamp
    pub fn apply_intent(&mut self, direction: Vec2, field: Vec2) {
        let step = crate::normalize_or_unchanged(direction) * self.speed;
        self.pos += step;
        self.clamp_to_field(field);
    }

    /// Keep the player inside the field with a 1-unit inset on every edge
    pub fn clamp_to_field(&mut self, field: Vec2) {
        let lo = Vec2::splat(PLAYER_EDGE_INSET);
        let hi = field - self.size - Vec2::splat(PLAYER_EDGE_INSET);
        self.pos = self.pos.clamp(lo, hi);
    }
}

/// Large obstacle whose proximity dilates time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityObstacle {
    /// Diameter
    pub size: f32,
    /// Index of the size tier this obstacle was drawn from. Reported with
    /// the dilation result but not part of the multiplier formula.
    pub delta_t: u8,
}

impl GravityObstacle {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }
}

/// Small obstacle with a fixed spawn-time velocity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomObstacle {
    /// Diameter
    pub size: f32,
    /// Velocity at multiplier 1.0, fixed at spawn
    pub base_vel: Vec2,
}

/// Scoring checkpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub size: Vec2,
}

/// Per-kind entity data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Gravity(GravityObstacle),
    Random(RandomObstacle),
    Gate(Gate),
}

/// A non-player entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Top-left corner of the bounding box
    pub pos: Vec2,
    /// Velocity applied on the last tick (base velocity times multiplier)
    pub vel: Vec2,
    pub alive: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, pos: Vec2, kind: EntityKind) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            alive: true,
            kind,
        }
    }

    pub fn class(&self) -> EntityClass {
        match self.kind {
            EntityKind::Gravity(_) => EntityClass::GravityObstacle,
            EntityKind::Random(_) => EntityClass::RandomObstacle,
            EntityKind::Gate(_) => EntityClass::Gate,
        }
    }

    /// Gravity and random obstacles end the run on contact
    #[inline]
    pub fn is_obstacle(&self) -> bool {
        !matches!(self.kind, EntityKind::Gate(_))
    }

    #[inline]
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, EntityKind::Gate(_))
    }

    pub fn size(&self) -> Vec2 {
        match &self.kind {
            EntityKind::Gravity(g) => Vec2::splat(g.size),
            EntityKind::Random(r) => Vec2::splat(r.size),
            EntityKind::Gate(g) => g.size,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, self.size())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    /// Precise collision shape: obstacles are discs, gates are rectangles
    pub fn shape(&self) -> Shape {
        match &self.kind {
            EntityKind::Gravity(g) => Shape::Circle(Circle::new(self.center(), g.radius())),
            EntityKind::Random(r) => Shape::Circle(Circle::new(self.center(), r.size / 2.0)),
            EntityKind::Gate(_) => Shape::Rect(self.bounds()),
        }
    }

    /// Velocity at multiplier 1.0
    pub fn base_velocity(&self, tuning: &Tuning) -> Vec2 {
        match &self.kind {
            EntityKind::Gravity(_) => Vec2::new(0.0, tuning.gravity_velocity),
            EntityKind::Random(r) => r.base_vel,
            EntityKind::Gate(_) => Vec2::new(0.0, tuning.gate_velocity),
        }
    }

    /// Move one tick. The multiplier rescales the base velocity; it never
    /// accumulates into it.
    pub fn advance(&mut self, multiplier: f32, tuning: &Tuning) {
        self.vel = self.base_velocity(tuning) * multiplier;
        self.pos += self.vel;
    }

    /// Whether the bounds are fully past a field edge the entity moves toward
    pub fn has_left_field(&self, field: Vec2) -> bool {
        let b = self.bounds();
        let max = b.max();
        (self.vel.x > 0.0 && b.min.x >= field.x)
            || (self.vel.x < 0.0 && max.x <= 0.0)
            || (self.vel.y > 0.0 && b.min.y >= field.y)
            || (self.vel.y < 0.0 && max.y <= 0.0)
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Player touched an obstacle
    Collision,
    /// A gate left the bottom of the field untouched
    MissedGate,
    /// External quit signal
    Quit,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Collision => "collision",
            EndReason::MissedGate => "missed_gate",
            EndReason::Quit => "quit",
        }
    }

    /// Lead-in of the end-of-run message
    pub fn message(&self) -> &'static str {
        match self {
            EndReason::Collision => "Kaboom!! You are dead. ",
            EndReason::MissedGate => "You missed a gate! ",
            EndReason::Quit => "",
        }
    }
}

/// Final summary of a terminated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    pub reason: EndReason,
    pub final_score: u64,
    pub gates_passed: u64,
}

impl fmt::Display for GameOver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Your final score is {} points! You passed {} gates!",
            self.reason.message(),
            self.final_score,
            self.gates_passed
        )
    }
}

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Running,
    Terminated(GameOver),
}

/// Things that happened during one tick, in order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    Spawned { id: EntityId, class: EntityClass },
    GatePassed { id: EntityId },
    Culled { id: EntityId },
    SpeedIncreased { game_speed: f32 },
    Ended(GameOver),
}

/// Read-only view of one body for presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    /// `None` for the player
    pub id: Option<EntityId>,
    pub class: EntityClass,
    pub pos: Vec2,
    pub size: Vec2,
    pub shape: Shape,
    pub alive: bool,
}

/// Per-tick output for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub elapsed_ms: f64,
    pub score: u64,
    pub passed_gates: u64,
    pub game_speed: f32,
    pub multiplier: f32,
    /// Size tier of the gravity obstacle currently dominating dilation
    pub dominant_tier: Option<u8>,
    pub player: EntityView,
    pub entities: Vec<EntityView>,
    pub status: Status,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub tuning: Tuning,
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    /// Fixed steps taken so far
    pub time_ticks: u64,
    /// Global speed; only ever increases
    pub game_speed: f32,
    /// Elapsed time (ms) after which the next speed ramp fires
    pub speed_ramp_at_ms: f64,
    pub passed_gates: u64,
    /// Score projection as of the last tick
    pub score: u64,
    /// Dilation multiplier of the last tick
    pub multiplier: f32,
    /// Gravity obstacle that set the last multiplier, if any was in range
    pub dominant: Option<Influence>,
    pub status: Status,
    pub player: Player,
    /// Live non-player entities, sorted by id
    pub entities: Vec<Entity>,
    pub spawner: Spawner,
    next_id: EntityId,
}

impl World {
    /// Create a world; fails fast on invalid constants
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, ConfigError> {
        tuning.validate()?;

        let world = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            game_speed: tuning.game_speed,
            speed_ramp_at_ms: tuning.speed_ramp_interval_ms,
            passed_gates: 0,
            score: 0,
            multiplier: tuning.game_speed,
            dominant: None,
            status: Status::Running,
            player: Player::new(&tuning),
            entities: Vec::new(),
            spawner: Spawner::new(&tuning),
            next_id: 1,
            tuning,
        };

        log::info!(
            "New world {}x{} (seed {})",
            world.tuning.field_width,
            world.tuning.field_height,
            seed
        );
        Ok(world)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Split borrow for spawn factories
    pub(crate) fn tuning_and_rng(&mut self) -> (&Tuning, &mut Pcg32) {
        (&self.tuning, &mut self.rng)
    }

    #[inline]
    pub fn field(&self) -> Vec2 {
        Vec2::new(self.tuning.field_width, self.tuning.field_height)
    }

    /// Milliseconds of simulated time
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.time_ticks as f64 * self.tuning.tick_ms
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Running)
    }

    pub fn game_over(&self) -> Option<GameOver> {
        match self.status {
            Status::Running => None,
            Status::Terminated(over) => Some(over),
        }
    }

    /// Add an entity; ids are allocated in increasing order so the store
    /// stays sorted
    pub fn insert(&mut self, entity: Entity) {
        debug_assert!(self.entities.last().is_none_or(|e| e.id < entity.id));
        self.entities.push(entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entities[i])
    }

    /// Live gravity obstacles with their data
    pub fn gravity_obstacles(&self) -> impl Iterator<Item = (&Entity, &GravityObstacle)> {
        self.entities.iter().filter_map(|e| match &e.kind {
            EntityKind::Gravity(g) if e.alive => Some((e, g)),
            _ => None,
        })
    }

    /// Live obstacles of both kinds
    pub fn obstacles(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.alive && e.is_obstacle())
    }

    pub fn gates(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.alive && e.is_gate())
    }

    /// Drop every entity marked dead; returns their ids
    pub fn remove_dead(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| !e.alive)
            .map(|e| e.id)
            .collect();
        if !dead.is_empty() {
            self.entities.retain(|e| e.alive);
        }
        dead
    }

    /// Score as a pure function of elapsed time and gates passed
    pub fn score_for(tuning: &Tuning, elapsed_ms: f64, passed_gates: u64) -> u64 {
        let time_points = (elapsed_ms / tuning.score_divisor_ms).floor() as u64;
        time_points.saturating_add(passed_gates.saturating_mul(tuning.gate_score_weight))
    }

    /// Recompute (never accumulate) the score projection
    pub fn recompute_score(&mut self) -> u64 {
        self.score = Self::score_for(&self.tuning, self.elapsed_ms(), self.passed_gates);
        self.score
    }

    /// End the session; the first reason recorded wins
    pub fn terminate(&mut self, reason: EndReason) -> GameOver {
        if let Status::Terminated(over) = self.status {
            return over;
        }
        let over = GameOver {
            reason,
            final_score: self.recompute_score(),
            gates_passed: self.passed_gates,
        };
        self.status = Status::Terminated(over);
        log::info!("Game over ({}): {}", reason.as_str(), over);
        over
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }

    pub fn snapshot(&self) -> Snapshot {
        let player = EntityView {
            id: None,
            class: EntityClass::Player,
            pos: self.player.pos,
            size: self.player.size,
            shape: self.player.shape(),
            alive: self.is_running(),
        };
        let entities = self
            .entities
            .iter()
            .map(|e| EntityView {
                id: Some(e.id),
                class: e.class(),
                pos: e.pos,
                size: e.size(),
                shape: e.shape(),
                alive: e.alive,
            })
            .collect();

        Snapshot {
            tick: self.time_ticks,
            elapsed_ms: self.elapsed_ms(),
            score: self.score,
            passed_gates: self.passed_gates,
            game_speed: self.game_speed,
            multiplier: self.multiplier,
            dominant_tier: self.dominant.map(|d| d.delta_t),
            player,
            entities,
            status: self.status,
        }
    }
}

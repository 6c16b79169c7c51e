//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world deterministically, one fixed step
//! per call, in this order:
//! 1. spawn due entities (intervals from the previous tick's multiplier)
//! 2. compute the dilation multiplier from pre-motion positions
//! 3. move the player (never dilated)
//! 4. move everything else scaled by the multiplier, cull off-field bodies
//! 5. judge gates and collisions
//! 6. recompute the score
//! 7. ramp game speed

use glam::Vec2;

use super::collision::judge;
use super::dilation::world_multiplier;
use super::spawner::spawn;
use super::state::{EndReason, GameEvent, World};
use crate::consts::MOVE_STEP;

/// Held directional input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Move-map vector for this key (y grows downward)
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::new(-MOVE_STEP, 0.0),
            Direction::Right => Vec2::new(MOVE_STEP, 0.0),
            Direction::Up => Vec2::new(0.0, -MOVE_STEP),
            Direction::Down => Vec2::new(0.0, MOVE_STEP),
        }
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Summed intent; normalized by the player before use
    pub direction: Vec2,
    /// End the session
    pub quit: bool,
}

impl TickInput {
    /// Sum the move-map vectors of every held key
    pub fn from_held(held: &[Direction]) -> Self {
        Self {
            direction: held.iter().map(|d| d.vector()).sum(),
            quit: false,
        }
    }

    pub fn quit() -> Self {
        Self {
            direction: Vec2::ZERO,
            quit: true,
        }
    }
}

/// Advance the world by one fixed timestep and return what happened
pub fn tick(world: &mut World, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // Terminal: no further updates
    if !world.is_running() {
        return events;
    }

    if input.quit {
        let over = world.terminate(EndReason::Quit);
        events.push(GameEvent::Ended(over));
        return events;
    }

    world.time_ticks += 1;
    let now = world.elapsed_ms();

    // Spawn
    for class in world.spawner.poll(now) {
        if let Some(entity) = spawn(world, class) {
            events.push(GameEvent::Spawned {
                id: entity.id,
                class,
            });
        }
    }

    // Dilation from pre-motion positions; intervals apply from the next poll
    let dilation = world_multiplier(world);
    world.multiplier = dilation.multiplier;
    world.dominant = dilation.dominant;
    world.spawner.rescale(dilation.multiplier);
    log::trace!(
        "tick {}: multiplier {:.3} (raw {:.3})",
        world.time_ticks,
        dilation.multiplier,
        dilation.raw
    );

    let field = world.field();
    world.player.apply_intent(input.direction, field);

    // Non-player motion, then cull in one batch
    let mut missed_gates = 0;
    for entity in world.entities.iter_mut() {
        entity.advance(dilation.multiplier, &world.tuning);
        if entity.has_left_field(field) {
            entity.alive = false;
            if entity.is_gate() {
                missed_gates += 1;
                log::debug!("Gate #{} left the field untouched", entity.id);
            }
        }
    }
    for id in world.remove_dead() {
        events.push(GameEvent::Culled { id });
    }

    let judgement = judge(&world.player, &mut world.entities, missed_gates);
    world.passed_gates = world
        .passed_gates
        .saturating_add(judgement.passed.len() as u64);
    for &id in &judgement.passed {
        log::debug!("Gate #{} passed ({} total)", id, world.passed_gates);
        events.push(GameEvent::GatePassed { id });
    }
    if let Some(id) = judgement.hit_by {
        log::debug!("Obstacle #{} destroyed on contact", id);
    }
    // Passed gates and the hitting obstacle leave before termination
    world.remove_dead();

    world.recompute_score();

    if let Some(reason) = judgement.end {
        let over = world.terminate(reason);
        events.push(GameEvent::Ended(over));
        return events;
    }

    if now > world.speed_ramp_at_ms {
        let before = world.game_speed;
        world.game_speed += world.tuning.speed_increase;
        world.speed_ramp_at_ms = world
            .tuning
            .speed_ramp
            .advance(world.speed_ramp_at_ms, world.tuning.speed_ramp_interval_ms);
        debug_assert!(world.game_speed >= before);
        log::debug!(
            "Game speed {:.2} (next ramp at {:.0} ms)",
            world.game_speed,
            world.speed_ramp_at_ms
        );
        events.push(GameEvent::SpeedIncreased {
            game_speed: world.game_speed,
        });
    }

    // Ensure deterministic ordering
    world.normalize_order();
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SpeedRamp, Tuning};
    use crate::sim::state::{
        EntityClass, EntityId, EntityKind, Entity, Gate, GravityObstacle, RandomObstacle, Status,
    };

    /// Tuning with spawning effectively disabled
    fn quiet_tuning() -> Tuning {
        Tuning {
            gate_spawn_ms: 1e12,
            gravity_spawn_ms: 1e12,
            random_spawn_ms: 1e12,
            ..Default::default()
        }
    }

    fn quiet_world() -> World {
        World::new(quiet_tuning(), 1234).unwrap()
    }

    fn add(world: &mut World, pos: Vec2, kind: EntityKind) -> EntityId {
        let id = world.next_entity_id();
        world.insert(Entity::new(id, pos, kind));
        id
    }

    fn add_gate(world: &mut World, pos: Vec2) -> EntityId {
        let size = world.tuning.gate_size();
        add(world, pos, EntityKind::Gate(Gate { size }))
    }

    fn add_planet(world: &mut World, center: Vec2, size: f32) -> EntityId {
        add(
            world,
            center - Vec2::splat(size / 2.0),
            EntityKind::Gravity(GravityObstacle { size, delta_t: 2 }),
        )
    }

    #[test]
    fn test_from_held_sums_move_map() {
        let input = TickInput::from_held(&[Direction::Right, Direction::Down]);
        assert_eq!(input.direction, Vec2::new(0.1, 0.1));
        assert!(!input.quit);

        let input = TickInput::from_held(&[Direction::Left, Direction::Right]);
        assert_eq!(input.direction, Vec2::ZERO);
    }

    #[test]
    fn test_rightward_intent_clamps_at_edge() {
        let mut world = quiet_world();
        let input = TickInput::from_held(&[Direction::Right]);
        let limit = 700.0 - world.tuning.player_width - 1.0;

        let mut last_x = world.player.pos.x;
        for _ in 0..200 {
            tick(&mut world, &input);
            let x = world.player.pos.x;
            assert!(x >= last_x);
            if last_x < limit {
                assert!(x > last_x);
            }
            assert!(x <= limit);
            last_x = x;
        }
        assert_eq!(world.player.pos.x, limit);
        assert!(world.is_running());
    }

    #[test]
    fn test_overlapping_planet_floors_multiplier() {
        let mut world = quiet_world();
        let center = world.player.center();
        add_planet(&mut world, center, 200.0);

        let events = tick(&mut world, &TickInput::default());
        assert_eq!(world.multiplier, 0.25 * 0.75);
        assert_eq!(world.dominant.map(|d| d.delta_t), Some(2));
        // Sitting inside the planet is also a collision
        assert!(matches!(events.last(), Some(GameEvent::Ended(_))));
        assert_eq!(world.game_over().map(|o| o.reason), Some(EndReason::Collision));
    }

    #[test]
    fn test_dilation_slows_non_player_motion() {
        let mut world = quiet_world();
        let center = world.player.center();
        // Surface 50 units to the right of the player center: raw = 0.5
        add_planet(&mut world, center + Vec2::new(150.0, 0.0), 200.0);
        let gate = add_gate(&mut world, Vec2::new(10.0, 10.0));

        tick(&mut world, &TickInput::default());
        let expected = 0.5 * 0.75 * world.tuning.gate_velocity;
        let vel = world.get(gate).map(|g| g.vel.y).unwrap();
        assert!((vel - expected).abs() < 1e-4);
        assert!(world.is_running());

        // Spawn cadence stretched by the same multiplier
        let gravity = world.spawner.gravity;
        assert!((gravity.effective_interval - 1e12 / (0.5 * 0.75) as f64).abs() / 1e12 < 1e-5);
    }

    #[test]
    fn test_missed_gate_ends_on_that_tick() {
        let mut world = quiet_world();
        let gate = add_gate(&mut world, Vec2::new(600.0, 990.0));

        // 3.75 units per tick at game speed 0.75
        let mut ended_at = None;
        for i in 0..10 {
            let was_running = world.is_running();
            let events = tick(&mut world, &TickInput::default());
            if was_running && !world.is_running() {
                ended_at = Some(i);
                assert!(events.contains(&GameEvent::Culled { id: gate }));
                break;
            }
        }

        // y: 993.75, 997.5, 1001.25 -> off the field on the third tick
        assert_eq!(ended_at, Some(2));
        assert_eq!(world.game_over().map(|o| o.reason), Some(EndReason::MissedGate));
        assert!(world.get(gate).is_none());
    }

    #[test]
    fn test_collision_freezes_world() {
        let mut world = quiet_world();
        let pos = world.player.pos + Vec2::new(-20.0, 5.0);
        let rock = add(
            &mut world,
            pos,
            EntityKind::Random(RandomObstacle {
                size: 15.0,
                base_vel: Vec2::new(11.0, 0.0),
            }),
        );

        tick(&mut world, &TickInput::default());
        let over = world.game_over().unwrap();
        assert_eq!(over.reason, EndReason::Collision);
        assert_eq!(over.reason.as_str(), "collision");

        // The obstacle is destroyed on contact, in the same tick
        assert!(world.get(rock).is_none());
        assert!(world.snapshot().entities.iter().all(|v| v.id != Some(rock)));

        let frozen_player = world.player.pos;
        let frozen_tick = world.time_ticks;
        let events = tick(&mut world, &TickInput::from_held(&[Direction::Up]));
        assert!(events.is_empty());
        assert_eq!(world.player.pos, frozen_player);
        assert_eq!(world.time_ticks, frozen_tick);
        assert_eq!(world.status, Status::Terminated(over));
    }

    #[test]
    fn test_gate_pass_scores() {
        let mut world = quiet_world();
        let pos = world.player.pos + Vec2::new(-20.0, 2.0);
        let gate = add_gate(&mut world, pos);

        let events = tick(&mut world, &TickInput::default());
        assert!(events.contains(&GameEvent::GatePassed { id: gate }));
        assert_eq!(world.passed_gates, 1);
        assert_eq!(world.score, 50);
        assert!(world.get(gate).is_none());
        assert!(world.is_running());
    }

    #[test]
    fn test_quit_reports_score() {
        let mut world = quiet_world();
        for _ in 0..61 {
            tick(&mut world, &TickInput::default());
        }
        let events = tick(&mut world, &TickInput::quit());
        let over = world.game_over().unwrap();
        assert_eq!(events, vec![GameEvent::Ended(over)]);
        assert_eq!(over.reason, EndReason::Quit);
        assert_eq!(over.final_score, 2);
        assert_eq!(over.to_string(), "Your final score is 2 points! You passed 0 gates!");
    }

    #[test]
    fn test_score_stable_without_ticks() {
        let mut world = quiet_world();
        for _ in 0..45 {
            tick(&mut world, &TickInput::default());
        }
        let a = world.recompute_score();
        let b = world.recompute_score();
        assert_eq!(a, b);
        assert_eq!(a, world.snapshot().score);
    }

    #[test]
    fn test_speed_ramp_doubling() {
        let mut world = quiet_world();
        let mut ramps = 0;
        let mut last = world.game_speed;
        for _ in 0..120 {
            for event in tick(&mut world, &TickInput::default()) {
                if let GameEvent::SpeedIncreased { game_speed } = event {
                    assert!(game_speed > last);
                    last = game_speed;
                    ramps += 1;
                }
            }
        }
        // Thresholds 100, 200, 400, 800, 1600 ms within 2000 ms
        assert_eq!(ramps, 5);
        assert!((world.game_speed - 0.80).abs() < 1e-5);
        assert_eq!(world.speed_ramp_at_ms, 3200.0);
    }

    #[test]
    fn test_speed_ramp_fixed() {
        let tuning = Tuning {
            speed_ramp: SpeedRamp::Fixed,
            speed_ramp_interval_ms: 500.0,
            ..quiet_tuning()
        };
        let mut world = World::new(tuning, 1).unwrap();
        for _ in 0..110 {
            tick(&mut world, &TickInput::default());
        }
        // Thresholds 500, 1000, 1500 passed; 2000 not yet reached
        assert!((world.game_speed - 0.78).abs() < 1e-5);
    }

    #[test]
    fn test_spawns_follow_timers() {
        let mut world = World::new(Tuning::default(), 99).unwrap();
        let mut spawned = Vec::new();
        // 40 ticks ~ 667 ms: only the random line (500 ms) is due
        for _ in 0..40 {
            for event in tick(&mut world, &TickInput::default()) {
                if let GameEvent::Spawned { class, .. } = event {
                    spawned.push(class);
                }
            }
        }
        assert_eq!(spawned, vec![EntityClass::RandomObstacle]);
    }

    #[test]
    fn test_culled_entities_never_return() {
        let mut world = World::new(Tuning::default(), 2024).unwrap();
        let mut culled = std::collections::HashSet::new();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..2000 {
            if !world.is_running() {
                break;
            }
            for event in tick(&mut world, &TickInput::default()) {
                match event {
                    GameEvent::Spawned { id, .. } => assert!(seen.insert(id)),
                    GameEvent::Culled { id } => {
                        culled.insert(id);
                    }
                    _ => {}
                }
            }
            for e in &world.entities {
                assert!(!culled.contains(&e.id));
                assert!(e.alive);
            }
        }
    }

    #[test]
    fn test_determinism() {
        // Two worlds with the same seed and inputs evolve identically
        let mut a = World::new(Tuning::default(), 99999).unwrap();
        let mut b = World::new(Tuning::default(), 99999).unwrap();

        let inputs = [
            TickInput::from_held(&[Direction::Left]),
            TickInput::from_held(&[Direction::Up, Direction::Right]),
            TickInput::default(),
        ];

        for i in 0..400 {
            let input = &inputs[i % inputs.len()];
            assert_eq!(tick(&mut a, input), tick(&mut b, input));
        }

        let snap_a = serde_json::to_string(&a.snapshot()).unwrap();
        let snap_b = serde_json::to_string(&b.snapshot()).unwrap();
        assert_eq!(snap_a, snap_b);
    }
}

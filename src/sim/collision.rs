//! Collision and termination judge
//!
//! Runs after motion each tick, in a fixed order:
//! 1. gates touching the player are collected (coarse rectangle test)
//! 2. the first obstacle whose shape touches the player ends the run
//! 3. otherwise a gate that fell off the bottom this tick ends the run
//!
//! The judge only reads positions. It marks passed gates and the obstacle
//! that hit the player dead; removal and termination are applied by the
//! caller.

use super::state::{EndReason, Entity, EntityId, Player};

/// Outcome of one judge pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Judgement {
    /// Gates the player touched this tick (now marked dead)
    pub passed: Vec<EntityId>,
    /// Obstacle that hit the player, if any (now marked dead)
    pub hit_by: Option<EntityId>,
    pub end: Option<EndReason>,
}

/// Ids of live gates whose bounds overlap the player's bounds
pub fn gates_touched(player: &Player, entities: &[Entity]) -> Vec<EntityId> {
    let bounds = player.bounds();
    entities
        .iter()
        .filter(|e| e.alive && e.is_gate() && e.bounds().intersects(&bounds))
        .map(|e| e.id)
        .collect()
}

/// First live obstacle (by id) whose precise shape overlaps the player
pub fn first_obstacle_hit(player: &Player, entities: &[Entity]) -> Option<EntityId> {
    let shape = player.shape();
    let bounds = player.bounds();
    entities
        .iter()
        .filter(|e| e.alive && e.is_obstacle())
        // Coarse reject before the precise test
        .filter(|e| e.bounds().intersects(&bounds))
        .find(|e| e.shape().intersects(&shape))
        .map(|e| e.id)
}

/// Judge one tick. `missed_gates` is how many gates fell off the bottom
/// during this tick's motion phase.
pub fn judge(player: &Player, entities: &mut [Entity], missed_gates: usize) -> Judgement {
    let passed = gates_touched(player, entities);
    for e in entities.iter_mut() {
        if passed.contains(&e.id) {
            e.alive = false;
        }
    }

    let hit_by = first_obstacle_hit(player, entities);
    if let Some(e) = hit_by.and_then(|id| entities.iter_mut().find(|e| e.id == id)) {
        e.alive = false;
    }
    let end = if hit_by.is_some() {
        Some(EndReason::Collision)
    } else if missed_gates > 0 {
        Some(EndReason::MissedGate)
    } else {
        None
    };

    Judgement {
        passed,
        hit_by,
        end,
    }
}

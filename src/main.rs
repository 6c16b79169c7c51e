//! Relative Space headless driver
//!
//! Runs one session at a fixed step with a simple autopilot standing in for
//! keyboard input, then prints the end-of-run message.
//!
//! Usage: `relative-space [seed] [max_ticks] [tuning.json]`

use std::process::ExitCode;

use glam::Vec2;
use relative_space::Tuning;
use relative_space::sim::{Direction, GameEvent, TickInput, World, tick};

/// Five minutes at 60 Hz
const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 5;
/// Extra clearance the autopilot keeps from obstacle surfaces
const AVOID_MARGIN: f32 = 60.0;
/// Ignore steering errors smaller than this
const DEADZONE: f32 = 4.0;

/// Steer toward the lowest gate, away from anything close
fn autopilot(world: &World) -> TickInput {
    let player = world.player.center();
    let field = world.field();

    let target = world
        .gates()
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|gate| gate.center() + Vec2::new(0.0, 40.0))
        .unwrap_or(Vec2::new(field.x / 2.0, field.y * 0.7));
    let mut desired = target - player;

    for obstacle in world.obstacles() {
        let away = player - obstacle.center();
        let radius = obstacle.size().x / 2.0;
        let clearance = away.length() - radius;
        if clearance < AVOID_MARGIN {
            let push = (AVOID_MARGIN - clearance) * 8.0;
            desired += away.normalize_or_zero() * push;
        }
    }

    let mut held = Vec::with_capacity(2);
    if desired.x > DEADZONE {
        held.push(Direction::Right);
    } else if desired.x < -DEADZONE {
        held.push(Direction::Left);
    }
    if desired.y > DEADZONE {
        held.push(Direction::Down);
    } else if desired.y < -DEADZONE {
        held.push(Direction::Up);
    }
    TickInput::from_held(&held)
}

fn parse_arg<T: std::str::FromStr>(arg: Option<String>, name: &str) -> Result<Option<T>, String> {
    match arg {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid {name}: {s}")),
    }
}

fn load_tuning(path: Option<String>) -> Result<Tuning, String> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let json = std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?;
    Tuning::from_json(&json).map_err(|e| format!("{path}: {e}"))
}

fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let seed = parse_arg::<u64>(args.next(), "seed")?.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    });
    let max_ticks = parse_arg::<u64>(args.next(), "max_ticks")?.unwrap_or(DEFAULT_MAX_TICKS);
    let tuning = load_tuning(args.next())?;

    let mut world = World::new(tuning, seed).map_err(|e| e.to_string())?;
    log::info!("Relative Space starting (seed {seed}, up to {max_ticks} ticks)");

    while world.is_running() {
        let input = if world.time_ticks >= max_ticks {
            TickInput::quit()
        } else {
            autopilot(&world)
        };

        for event in tick(&mut world, &input) {
            if let GameEvent::Ended(over) = event {
                println!("{over}");
            }
        }

        if world.time_ticks % 600 == 0 && world.is_running() {
            log::info!(
                "t={:.0}s score={} gates={} speed={:.2} multiplier={:.2} bodies={}",
                world.elapsed_ms() / 1000.0,
                world.score,
                world.passed_gates,
                world.game_speed,
                world.multiplier,
                world.entities.len()
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

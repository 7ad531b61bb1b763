//! Demo player used by the headless runner and soak tests

use super::entity::Entity;
use super::state::{RunStatus, Simulation};

/// Seconds of warning the autopilot wants before a red candle
const REACTION_TIME: f32 = 0.22;
/// Extra reach so slow starts still clear short candles
const REACTION_MARGIN: f32 = 10.0;

/// True when a grounded player should jump to clear the next red candle
pub fn should_jump(sim: &Simulation) -> bool {
    let player = sim.player();
    if sim.status() != RunStatus::Running || !player.grounded {
        return false;
    }

    let reach = sim.world().scroll_speed * REACTION_TIME + REACTION_MARGIN;
    let front = player.pos.x + player.size.x;
    sim.entities().any(|e| match e {
        Entity::Obstacle(o) if o.hazardous => {
            let gap = o.pos.x - front;
            (0.0..=reach).contains(&gap)
        }
        _ => false,
    })
}

/// Request a jump if the autopilot wants one, then advance
pub fn step(sim: &mut Simulation, dt: f32) {
    if should_jump(sim) {
        sim.request_jump();
    }
    sim.update(dt);
}

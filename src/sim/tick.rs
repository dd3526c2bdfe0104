//! Per-frame simulation tick
//!
//! One tick = one pursuit step followed by one contact check.

use super::collision::has_collided;
use super::pursuit::step_toward;
use super::state::{Entity, GameState};

/// What happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Chase goes on
    Continue,
    /// Pursuer touched the player
    Caught,
}

/// Advance the chase by one tick
///
/// Callers must only invoke this while the session is running.
pub fn tick(state: &mut GameState, pursuer_speed: f32) -> TickOutcome {
    let player = state.positions.get(Entity::Player);
    let pursuer = step_toward(state.positions.get(Entity::Pursuer), player, pursuer_speed);
    state.positions.set(Entity::Pursuer, pursuer);
    state.time_ticks += 1;

    if has_collided(player, pursuer) {
        TickOutcome::Caught
    } else {
        TickOutcome::Continue
    }
}

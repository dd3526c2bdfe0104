//! Greedy axis-independent pursuit
//!
//! Each axis closes its own gap by `speed` per tick. There is no diagonal
//! normalisation and no clamp to the target, so a step larger than the
//! remaining gap overshoots and the next tick steps back.

use glam::Vec2;

#[inline]
fn step_axis(from: f32, to: f32, speed: f32) -> f32 {
    if from < to {
        from + speed
    } else if from > to {
        from - speed
    } else {
        from
    }
}

/// Advance the pursuer one tick toward the player
pub fn step_toward(pursuer: Vec2, player: Vec2, speed: f32) -> Vec2 {
    Vec2::new(
        step_axis(pursuer.x, player.x, speed),
        step_axis(pursuer.y, player.y, speed),
    )
}

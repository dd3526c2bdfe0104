//! Player movement from discrete key presses

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::ENTITY_SIZE;

/// A directional signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Map a DOM `KeyboardEvent.key` name. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            "ArrowLeft" => Some(Direction::Left),
            "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit offset in screen coordinates (y grows downward)
    pub fn delta(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::NEG_Y,
            Direction::Down => Vec2::Y,
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
        }
    }
}

/// Largest allowed player coordinate on each axis
///
/// Floored at zero so a play area smaller than an entity pins it to the origin.
#[inline]
pub fn player_bounds(area: Vec2) -> Vec2 {
    (area - Vec2::splat(ENTITY_SIZE)).max(Vec2::ZERO)
}

/// Offset the player by `speed` in `dir`, clamped to the play area
pub fn move_player(pos: Vec2, dir: Direction, speed: f32, area: Vec2) -> Vec2 {
    let moved = pos + dir.delta() * speed;
    moved.clamp(Vec2::ZERO, player_bounds(area))
}

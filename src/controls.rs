//! Keyboard mapping
//!
//! Keys are DOM `KeyboardEvent.key` names so the browser shell can pass them
//! straight through.

use crate::sim::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    /// Pause toggle, or close the settings panel when it is open
    Escape,
}

impl Command {
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "Escape" {
            return Some(Command::Escape);
        }
        Direction::from_key(key).map(Command::Move)
    }
}

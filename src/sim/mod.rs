//! Game simulation module
//!
//! All gameplay logic lives here. This module is pure:
//! - One tick per display frame, no wall-clock time
//! - No rendering, audio or platform dependencies
//! - Phase gating is done by the caller (see `session`)

pub mod collision;
pub mod input;
pub mod pursuit;
pub mod state;
pub mod tick;

pub use collision::has_collided;
pub use input::{Direction, move_player, player_bounds};
pub use pursuit::step_toward;
pub use state::{Entity, GamePhase, GameState, Positions};
pub use tick::{TickOutcome, tick};

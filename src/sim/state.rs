//! Game state and core simulation types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Waiting for the first start
    #[default]
    NotStarted,
    /// Pursuer is chasing, input accepted
    Running,
    /// Frozen; no ticks, no input
    Paused,
    /// Player was caught; waiting for a fresh start
    Ended,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::NotStarted => "NotStarted",
            GamePhase::Running => "Running",
            GamePhase::Paused => "Paused",
            GamePhase::Ended => "Ended",
        }
    }

    /// NotStarted and Ended both wait for an explicit start
    pub fn awaiting_start(&self) -> bool {
        matches!(self, GamePhase::NotStarted | GamePhase::Ended)
    }

    /// A round is in progress (running or paused)
    pub fn in_round(&self) -> bool {
        matches!(self, GamePhase::Running | GamePhase::Paused)
    }
}

/// The two entities on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Player,
    Pursuer,
}

impl Entity {
    /// Spawn point, also used on reset
    pub fn start_position(&self) -> Vec2 {
        match self {
            Entity::Player => PLAYER_START,
            Entity::Pursuer => PURSUER_START,
        }
    }
}

/// Position store: one point per entity, never aliased
///
/// No validation here. Input clamps the player, the pursuer is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Positions {
    player: Vec2,
    pursuer: Vec2,
}

impl Default for Positions {
    fn default() -> Self {
        Self {
            player: Entity::Player.start_position(),
            pursuer: Entity::Pursuer.start_position(),
        }
    }
}

impl Positions {
    pub fn get(&self, entity: Entity) -> Vec2 {
        match entity {
            Entity::Player => self.player,
            Entity::Pursuer => self.pursuer,
        }
    }

    pub fn set(&mut self, entity: Entity, pos: Vec2) {
        match entity {
            Entity::Player => self.player = pos,
            Entity::Pursuer => self.pursuer = pos,
        }
    }

    pub fn player(&self) -> Vec2 {
        self.player
    }

    pub fn pursuer(&self) -> Vec2 {
        self.pursuer
    }
}

/// Complete simulation state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    pub positions: Positions,
    /// Ticks run in the current round
    pub time_ticks: u64,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put both entities back on their spawn points
    pub fn reset(&mut self) {
        self.positions = Positions::default();
        self.time_ticks = 0;
    }
}

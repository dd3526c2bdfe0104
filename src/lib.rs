//! Chaser - a tiny chase game
//!
//! Core modules:
//! - `sim`: Pure game logic (positions, input, pursuit, collisions, tick)
//! - `session`: Phase state machine driving the tick loop
//! - `scheduler`: Next-frame scheduling abstraction
//! - `sink`: Render/audio/layout collaborator interface
//! - `settings`: Player-tunable configuration
//! - `controls`: Keyboard mapping

pub mod audio;
pub mod controls;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod sim;
pub mod sink;

pub use audio::{AudioError, MusicTrack};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use session::Session;
pub use settings::{ConfigError, Settings, SettingsForm, Theme};
pub use sink::{RecordingSink, Sink, SinkEvent};

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Player spawn point
    pub const PLAYER_START: Vec2 = Vec2::new(100.0, 100.0);
    /// Pursuer spawn point
    pub const PURSUER_START: Vec2 = Vec2::new(300.0, 300.0);

    /// Visual size of both entities (square)
    pub const ENTITY_SIZE: f32 = 50.0;
    /// Contact happens when both axis gaps are below this
    pub const CONTACT_RANGE: f32 = 50.0;

    /// Player step per key press
    pub const DEFAULT_PLAYER_SPEED: f32 = 40.0;
    /// Pursuer step per tick
    pub const DEFAULT_PURSUER_SPEED: f32 = 1.0;
    /// Music volume (0.0 - 1.0)
    pub const DEFAULT_VOLUME: f32 = 0.5;

    pub const DEFAULT_PURSUER_SPRITE: &str = "ASSETS/domori.png";
    pub const DEFAULT_MUSIC_TRACK: &str = "ASSETS/MUSIC/track1.mp3";

    /// Play area used when no layout is available (headless runs)
    pub const DEFAULT_AREA: Vec2 = Vec2::new(800.0, 600.0);
}

//! Render/audio/layout collaborator
//!
//! The session pushes everything visible or audible through a [`Sink`]. The
//! browser shell implements it with DOM calls; tests use [`RecordingSink`].

use glam::Vec2;

use crate::audio::{AudioError, MusicTrack};
use crate::consts::DEFAULT_AREA;
use crate::settings::Settings;

pub trait Sink {
    /// Both positions changed (or may have)
    fn notify_positions(&mut self, player: Vec2, pursuer: Vec2);

    /// Current play area size, queried for each player move
    fn area_bounds(&self) -> Vec2;

    fn on_start(&mut self) {}
    fn on_pause(&mut self) {}
    fn on_resume(&mut self) {}
    /// The pursuer caught the player; positions reset right after
    fn on_caught(&mut self) {}
    /// New settings were applied (theme, sprite, ...)
    fn on_config_updated(&mut self, _settings: &Settings) {}
    fn on_settings_panel(&mut self, _open: bool) {}

    /// Start (or continue) playing `track` at `volume`
    fn play_audio(&mut self, track: &MusicTrack, volume: f32) -> Result<(), AudioError>;
    /// Pause, keeping the playback position
    fn pause_audio(&mut self);
    /// Pause and rewind
    fn stop_audio(&mut self);
    fn set_volume(&mut self, volume: f32);
}

/// One recorded [`Sink`] call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Positions { player: Vec2, pursuer: Vec2 },
    Start,
    Pause,
    Resume,
    Caught,
    ConfigUpdated(Settings),
    SettingsPanel(bool),
    PlayAudio { track: MusicTrack, volume: f32 },
    PauseAudio,
    StopAudio,
    SetVolume(f32),
}

impl SinkEvent {
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            SinkEvent::PlayAudio { .. }
                | SinkEvent::PauseAudio
                | SinkEvent::StopAudio
                | SinkEvent::SetVolume(_)
        )
    }
}

/// Sink that records every call. Used headless and in tests.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub area: Vec2,
    /// Make `play_audio` fail, like a browser blocking autoplay
    pub reject_playback: bool,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(DEFAULT_AREA)
    }
}

impl RecordingSink {
    pub fn new(area: Vec2) -> Self {
        Self {
            events: Vec::new(),
            area,
            reject_playback: false,
        }
    }

    /// Take all events recorded so far
    pub fn drain(&mut self) -> Vec<SinkEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn audio_events(&self) -> Vec<&SinkEvent> {
        self.events.iter().filter(|e| e.is_audio()).collect()
    }

    /// Latest position notification, if any
    pub fn last_positions(&self) -> Option<(Vec2, Vec2)> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Positions { player, pursuer } => Some((*player, *pursuer)),
            _ => None,
        })
    }
}

impl Sink for RecordingSink {
    fn notify_positions(&mut self, player: Vec2, pursuer: Vec2) {
        self.events.push(SinkEvent::Positions { player, pursuer });
    }

    fn area_bounds(&self) -> Vec2 {
        self.area
    }

    fn on_start(&mut self) {
        self.events.push(SinkEvent::Start);
    }

    fn on_pause(&mut self) {
        self.events.push(SinkEvent::Pause);
    }

    fn on_resume(&mut self) {
        self.events.push(SinkEvent::Resume);
    }

    fn on_caught(&mut self) {
        self.events.push(SinkEvent::Caught);
    }

    fn on_config_updated(&mut self, settings: &Settings) {
        self.events.push(SinkEvent::ConfigUpdated(settings.clone()));
    }

    fn on_settings_panel(&mut self, open: bool) {
        self.events.push(SinkEvent::SettingsPanel(open));
    }

    fn play_audio(&mut self, track: &MusicTrack, volume: f32) -> Result<(), AudioError> {
        self.events.push(SinkEvent::PlayAudio {
            track: track.clone(),
            volume,
        });
        if self.reject_playback {
            return Err(AudioError::Playback("autoplay blocked".to_string()));
        }
        Ok(())
    }

    fn pause_audio(&mut self) {
        self.events.push(SinkEvent::PauseAudio);
    }

    fn stop_audio(&mut self) {
        self.events.push(SinkEvent::StopAudio);
    }

    fn set_volume(&mut self, volume: f32) {
        self.events.push(SinkEvent::SetVolume(volume));
    }
}

//! Game settings
//!
//! Supplied by the settings form (web) or a JSON file (native). Never persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::MusicTrack;
use crate::consts::*;

/// Play area colour scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Dark mode checkbox state to theme
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark { Theme::Dark } else { Theme::Light }
    }

    /// Play area background colour (CSS)
    pub fn background_color(&self) -> &'static str {
        match self {
            Theme::Light => "#f0f0f0",
            Theme::Dark => "#333333",
        }
    }
}

/// Rejected configuration. Nothing is applied when this is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive number, got {value}")]
    InvalidSpeed { field: &'static str, value: f32 },
    #[error("volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),
    #[error("{field} is not a number: {value:?}")]
    NotNumeric { field: &'static str, value: String },
    #[error("malformed settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Player-tunable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Player step per key press
    pub player_speed: f32,
    /// Pursuer step per tick
    pub pursuer_speed: f32,
    pub theme: Theme,
    /// Pursuer sprite URL, or "none"
    pub pursuer_sprite: String,
    pub music_track: MusicTrack,
    /// Music volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_speed: DEFAULT_PLAYER_SPEED,
            pursuer_speed: DEFAULT_PURSUER_SPEED,
            theme: Theme::Light,
            pursuer_sprite: DEFAULT_PURSUER_SPRITE.to_string(),
            music_track: MusicTrack::from(DEFAULT_MUSIC_TRACK),
            volume: DEFAULT_VOLUME,
        }
    }
}

impl Settings {
    /// Check ranges. Speeds must be finite and > 0, volume within [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("player_speed", self.player_speed),
            ("pursuer_speed", self.pursuer_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidSpeed { field, value });
            }
        }
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::InvalidVolume(self.volume));
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// True when the sprite field asks for no image
    pub fn has_sprite(&self) -> bool {
        !self.pursuer_sprite.is_empty() && !self.pursuer_sprite.eq_ignore_ascii_case("none")
    }
}

/// Raw values as read from the settings form inputs
#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    pub player_speed: String,
    pub pursuer_speed: String,
    pub dark_mode: bool,
    pub pursuer_sprite: String,
    pub music_track: String,
    pub volume: String,
}

impl SettingsForm {
    /// Pre-fill the form from current settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            player_speed: settings.player_speed.to_string(),
            pursuer_speed: settings.pursuer_speed.to_string(),
            dark_mode: settings.theme == Theme::Dark,
            pursuer_sprite: settings.pursuer_sprite.clone(),
            music_track: settings.music_track.to_string(),
            volume: settings.volume.to_string(),
        }
    }

    /// Convert to validated settings
    pub fn parse(&self) -> Result<Settings, ConfigError> {
        let settings = Settings {
            player_speed: parse_number("player_speed", &self.player_speed)?,
            pursuer_speed: parse_number("pursuer_speed", &self.pursuer_speed)?,
            theme: Theme::from_dark_mode(self.dark_mode),
            pursuer_sprite: self.pursuer_sprite.trim().to_string(),
            music_track: MusicTrack::from(self.music_track.as_str()),
            volume: parse_number("volume", &self.volume)?,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f32, ConfigError> {
    raw.trim()
        .parse::<f32>()
        .map_err(|_| ConfigError::NotNumeric {
            field,
            value: raw.to_string(),
        })
}

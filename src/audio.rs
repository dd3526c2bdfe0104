//! Background music selection
//!
//! The actual playback lives behind [`crate::Sink`]; this module only names
//! tracks and the ways playback can fail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier used by the settings form for "no music"
pub const NO_TRACK: &str = "none";

/// A music track, or silence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MusicTrack {
    None,
    Track(String),
}

impl MusicTrack {
    pub fn as_str(&self) -> &str {
        match self {
            MusicTrack::None => NO_TRACK,
            MusicTrack::Track(src) => src,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, MusicTrack::None)
    }
}

impl From<&str> for MusicTrack {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(NO_TRACK) {
            MusicTrack::None
        } else {
            MusicTrack::Track(s.to_string())
        }
    }
}

impl From<String> for MusicTrack {
    fn from(s: String) -> Self {
        MusicTrack::from(s.as_str())
    }
}

impl From<MusicTrack> for String {
    fn from(track: MusicTrack) -> Self {
        track.as_str().to_string()
    }
}

impl std::fmt::Display for MusicTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback failures. Logged by the session, never surfaced to the player.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    /// The platform refused to play (e.g. autoplay policy)
    #[error("playback rejected: {0}")]
    Playback(String),
    /// No audio output exists in this environment
    #[error("audio output unavailable")]
    Unavailable,
}

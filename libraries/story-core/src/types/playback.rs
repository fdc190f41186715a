/// Media player status reports
use serde::{Deserialize, Serialize};

/// Status event emitted by the device media player
///
/// Field set mirrors what platform players report on every status callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
    pub is_buffering: bool,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub did_just_finish: bool,
    pub error: Option<String>,
}

impl PlaybackStatus {
    /// Playing at `position_ms` of `duration_ms`
    pub fn playing(position_ms: u64, duration_ms: u64) -> Self {
        Self {
            is_loaded: true,
            is_playing: true,
            position_ms,
            duration_ms: Some(duration_ms),
            ..Self::default()
        }
    }

    /// Loaded but stalled waiting for data
    pub fn buffering(position_ms: u64, duration_ms: Option<u64>) -> Self {
        Self {
            is_loaded: true,
            is_buffering: true,
            position_ms,
            duration_ms,
            ..Self::default()
        }
    }

    /// Reached the end of the media
    pub fn finished(duration_ms: u64) -> Self {
        Self {
            is_loaded: true,
            position_ms: duration_ms,
            duration_ms: Some(duration_ms),
            did_just_finish: true,
            ..Self::default()
        }
    }

    /// Player failed to decode the media
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Playback fraction reported by the player, if the duration is known
    pub fn fraction(&self) -> Option<f32> {
        match self.duration_ms {
            Some(duration) if duration > 0 => {
                Some((self.position_ms as f32 / duration as f32).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

//! Progress driver
//!
//! One driver is bound to one story activation. Image stories count up a
//! software clock; video stories mirror the position reported by the media
//! player. Either way the driver signals completion at most once.

use crate::types::DriverBinding;
use std::time::Duration;
use story_core::{MediaKind, PlaybackStatus, Story};

#[derive(Debug, Clone, PartialEq)]
enum DriverMode {
    Image {
        duration: Duration,
        elapsed: Duration,
    },
    Video {
        position_ms: u64,
        duration_ms: Option<u64>,
        buffering: bool,
    },
}

/// Progress source for the active story
#[derive(Debug, Clone)]
pub struct ProgressDriver {
    binding: DriverBinding,
    mode: DriverMode,
    /// Media is displaying; the image clock only runs once armed
    armed: bool,
    frozen: bool,
    completed: bool,
    looping: bool,
}

impl ProgressDriver {
    /// Driver for a freshly activated story, at progress 0 and not yet armed
    ///
    /// `default_image_duration` applies when an image story carries a zero
    /// duration.
    pub fn new(
        story: &Story,
        binding: DriverBinding,
        default_image_duration: Duration,
        looping: bool,
    ) -> Self {
        let mode = match story.kind {
            MediaKind::Image { duration_ms } => DriverMode::Image {
                duration: if duration_ms == 0 {
                    default_image_duration
                } else {
                    Duration::from_millis(duration_ms)
                },
                elapsed: Duration::ZERO,
            },
            MediaKind::Video => DriverMode::Video {
                position_ms: 0,
                duration_ms: None,
                buffering: true,
            },
        };

        Self {
            binding,
            mode,
            armed: false,
            frozen: false,
            completed: false,
            looping,
        }
    }

    pub fn binding(&self) -> &DriverBinding {
        &self.binding
    }

    pub fn is_video(&self) -> bool {
        matches!(self.mode, DriverMode::Video { .. })
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Whether the video is stalled (always false for images)
    pub fn is_buffering(&self) -> bool {
        matches!(self.mode, DriverMode::Video { buffering: true, .. })
    }

    /// Media is ready; start counting
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Hold progress at its current value
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Continue from the frozen value
    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    /// Looping videos never complete
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Back to 0 and unarmed, for a retry of the same story
    pub fn rewind(&mut self) {
        match &mut self.mode {
            DriverMode::Image { elapsed, .. } => *elapsed = Duration::ZERO,
            DriverMode::Video {
                position_ms,
                buffering,
                ..
            } => {
                *position_ms = 0;
                *buffering = true;
            }
        }
        self.armed = false;
        self.completed = false;
    }

    /// Progress from 0.0 to 1.0
    ///
    /// Pinned to 0 while a video buffers.
    pub fn progress(&self) -> f32 {
        match &self.mode {
            DriverMode::Image { duration, elapsed } => {
                if duration.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
                }
            }
            DriverMode::Video {
                buffering: true, ..
            } => 0.0,
            DriverMode::Video {
                position_ms,
                duration_ms,
                ..
            } => match duration_ms {
                Some(duration) if *duration > 0 => {
                    (*position_ms as f32 / *duration as f32).clamp(0.0, 1.0)
                }
                _ => 0.0,
            },
        }
    }

    /// Advance the image clock
    ///
    /// Returns `true` exactly once, on the tick that reaches the duration.
    /// Ignored for videos, before arming, and while frozen.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if !self.armed || self.frozen || self.completed {
            return false;
        }

        let DriverMode::Image { duration, elapsed } = &mut self.mode else {
            return false;
        };

        *elapsed = (*elapsed + delta).min(*duration);
        if *elapsed >= *duration {
            self.completed = true;
            return true;
        }
        false
    }

    /// Apply a player status report
    ///
    /// Returns `true` exactly once, when the player reports the end of a
    /// non-looping video. Position updates are ignored while frozen so the
    /// displayed value stays where the pause left it.
    pub fn on_status(&mut self, status: &PlaybackStatus) -> bool {
        if self.completed {
            return false;
        }

        let looping = self.looping;
        let frozen = self.frozen;
        let DriverMode::Video {
            position_ms,
            duration_ms,
            buffering,
        } = &mut self.mode
        else {
            return false;
        };

        if status.did_just_finish {
            if looping {
                *position_ms = 0;
                return false;
            }
            if let Some(duration) = status.duration_ms.or(*duration_ms) {
                *position_ms = duration;
                *duration_ms = Some(duration);
            }
            *buffering = false;
            self.completed = true;
            return true;
        }

        if frozen {
            return false;
        }

        *buffering = !status.is_loaded || status.is_buffering;
        if *buffering {
            return false;
        }

        *position_ms = status.position_ms;
        if status.duration_ms.is_some() {
            *duration_ms = status.duration_ms;
        }
        false
    }
}

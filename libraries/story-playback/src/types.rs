//! Core types for story navigation

use serde::{Deserialize, Serialize};
use std::time::Duration;
use story_core::{EngineConfig, NavigationCursor, Story, StoryId};

/// Navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationState {
    /// Showing the story at the cursor; progress runs
    Loaded(NavigationCursor),
    /// Showing the story at the cursor; progress frozen
    Paused(NavigationCursor),
    /// The feed has no stories
    Exhausted,
}

impl NavigationState {
    pub fn cursor(&self) -> Option<NavigationCursor> {
        match self {
            Self::Loaded(cursor) | Self::Paused(cursor) => Some(*cursor),
            Self::Exhausted => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused(_))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Identity of one story activation
///
/// The generation increases on every activation (and on retry), so a
/// completion carrying an older binding is recognisably stale even when it
/// names the same story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriverBinding {
    pub story_id: StoryId,
    pub generation: u64,
}

/// Observable media state of the active story
///
/// Distinct from `NavigationState`: a story can be paused while its media is
/// still loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaState {
    /// Waiting for the cache resolver to hand out a URI
    Resolving,
    /// Video loaded but stalled or not yet playing
    Buffering,
    /// Media is displaying
    Ready,
    /// The player could not decode the media; retry is offered
    Failed { message: String },
}

impl MediaState {
    /// Whether a loading affordance should be shown instead of progress
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Resolving | Self::Buffering)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Navigator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Fallback display time for image stories without a duration
    pub default_image_duration: Duration,
    /// Time a story must stay active before it qualifies as viewed
    pub dwell: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            default_image_duration: Duration::from_millis(5000),
            dwell: Duration::from_millis(1000),
        }
    }
}

impl From<&EngineConfig> for NavigatorConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            default_image_duration: config.playback.default_image_duration(),
            dwell: config.views.dwell(),
        }
    }
}

/// Everything the presentation layer needs to render the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerSnapshot {
    pub state: NavigationState,
    pub story: Option<Story>,
    pub binding: Option<DriverBinding>,
    /// Progress of the active story, 0.0 to 1.0
    pub progress: f32,
    pub media: MediaState,
    /// Playable URI once resolved
    pub media_uri: Option<String>,
    pub muted: bool,
    pub looping: bool,
    pub closed: bool,
}

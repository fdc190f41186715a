//! Viewer Events
//!
//! Event-based communication between the navigator, its session and the
//! presentation layer. Events are emitted at key points:
//! - State changes (loaded/paused/exhausted)
//! - Story changes (every cursor move)
//! - Progress updates (reset on activation, then per tick or status)
//! - Media requests and media state changes
//! - Dwell elapsed (the active story qualifies as viewed)

use crate::types::{DriverBinding, MediaState, NavigationState};
use serde::{Deserialize, Serialize};
use story_core::{NavigationCursor, Story, StoryId};

/// Events emitted by the story navigator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoryEvent {
    /// Navigation state changed
    StateChanged {
        /// The new navigation state
        state: NavigationStateEvent,
    },

    /// The cursor moved to a new story
    StoryChanged {
        cursor: NavigationCursor,
        story_id: StoryId,
        /// Story shown before the move (if any)
        previous_story_id: Option<StoryId>,
    },

    /// Progress of the active story changed
    ProgressChanged {
        story_id: StoryId,
        /// Progress from 0.0 to 1.0
        progress: f32,
    },

    /// The active story needs a playable URI
    ///
    /// Answer with `StoryNavigator::media_ready` carrying the same binding.
    MediaRequested {
        binding: DriverBinding,
        story: Story,
    },

    /// Media state of the active story changed
    MediaStateChanged {
        story_id: StoryId,
        state: MediaState,
    },

    /// The active story stayed on screen for the dwell delay
    ViewQualified {
        story_id: StoryId,
    },

    /// The last story of the last group completed
    FeedFinished,

    /// Playback error surfaced to the viewer
    Error {
        story_id: StoryId,
        message: String,
    },
}

/// Navigation state for events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationStateEvent {
    Loaded,
    Paused,
    Exhausted,
}

impl From<NavigationState> for NavigationStateEvent {
    fn from(state: NavigationState) -> Self {
        match state {
            NavigationState::Loaded(_) => NavigationStateEvent::Loaded,
            NavigationState::Paused(_) => NavigationStateEvent::Paused,
            NavigationState::Exhausted => NavigationStateEvent::Exhausted,
        }
    }
}

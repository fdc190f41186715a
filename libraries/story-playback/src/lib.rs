//! Story Viewer - Playback & Navigation
//!
//! Drives full-screen story playback across a two-level (author × story)
//! feed.
//!
//! This crate provides:
//! - Navigation state machine (advance, retreat, pause/resume, jump to group)
//! - Progress driver (software clock for images, player position for videos)
//! - Dwell-gated view qualification
//! - A tokio session task wiring the navigator to the cache resolver and the
//!   view guard
//!
//! # Architecture
//!
//! `StoryNavigator` is synchronous and deterministic: every transition
//! happens through `&mut self` and reports what it needs through
//! `StoryEvent`s. Each story activation gets a `DriverBinding` with a fresh
//! generation; callbacks carrying an older binding are dropped, so a stale
//! timer or player report can never move the cursor.
//!
//! `ViewerSession` runs the navigator on a tokio task and answers its media
//! and view requests with spawned work.
//!
//! # Example: Driving the navigator directly
//!
//! ```rust
//! use story_playback::{NavigatorConfig, StoryEvent, StoryNavigator};
//! use story_core::{MediaKind, Story, StoryFeed, StoryGroup, StoryId, UserId};
//! use std::time::Duration;
//!
//! let story = |id: &str| Story {
//!     id: StoryId::new(id),
//!     owner_id: UserId::new("u1"),
//!     kind: MediaKind::Image { duration_ms: 5000 },
//!     remote_ref: format!("u1/{}.jpg", id),
//!     caption: None,
//!     created_at: chrono::Utc::now(),
//! };
//! let feed = StoryFeed::new(vec![StoryGroup::new(
//!     UserId::new("u1"),
//!     "Alice",
//!     vec![story("s1"), story("s2")],
//! )]);
//!
//! let mut navigator = StoryNavigator::new(feed, NavigatorConfig::default());
//!
//! // Answer the media request for the first story
//! let binding = navigator
//!     .drain_events()
//!     .into_iter()
//!     .find_map(|event| match event {
//!         StoryEvent::MediaRequested { binding, .. } => Some(binding),
//!         _ => None,
//!     })
//!     .unwrap();
//! navigator.media_ready(&binding, "/cache/s1.jpg");
//!
//! // Five seconds of display time move on to the next story
//! navigator.tick(Duration::from_millis(5000));
//! assert_eq!(navigator.current_story().unwrap().id.as_str(), "s2");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod navigator;
pub mod progress;
pub mod session;
pub mod types;

pub use error::{NavigationError, Result};
pub use events::{NavigationStateEvent, StoryEvent};
pub use navigator::StoryNavigator;
pub use progress::ProgressDriver;
pub use session::{SessionConfig, SessionHandle, ViewerSession};
pub use types::{DriverBinding, MediaState, NavigationState, NavigatorConfig, ViewerSnapshot};

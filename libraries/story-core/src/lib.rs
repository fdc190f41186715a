//! Story Viewer Core
//!
//! Platform-agnostic domain types, collaborator traits, and error handling for
//! the story playback and preload engine.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Story`, `StoryGroup`, `StoryFeed`, `NavigationCursor`,
//!   `CacheEntry`, `PlaybackStatus`
//! - **Collaborator Traits**: `SigningService`, `MediaFetcher`, `LocalCacheStore`,
//!   `ViewBackend`, `MediaPlayer`
//! - **Error Handling**: Unified `StoryError` and `Result` types
//! - **Configuration**: `EngineConfig`, loadable from file and environment
//!
//! # Example
//!
//! ```rust
//! use story_core::types::{StoryFeed, StoryGroup, StoryRecord, UserId};
//! use std::time::Duration;
//!
//! let record = StoryRecord {
//!     id: "s1".to_string(),
//!     owner_id: "u1".to_string(),
//!     media_type: "image".to_string(),
//!     remote_ref: "u1/s1.jpg".to_string(),
//!     duration_ms: Some(4000),
//!     caption: None,
//!     created_at: chrono::Utc::now(),
//! };
//! let story = record.into_story(Duration::from_secs(5)).unwrap();
//!
//! let group = StoryGroup::new(UserId::new("u1"), "Alice", vec![story]);
//! let feed = StoryFeed::new(vec![group]);
//! assert_eq!(feed.total_stories(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{Result, StoryError};
pub use traits::{LocalCacheStore, MediaFetcher, MediaPlayer, SigningService, ViewBackend};

pub use types::{
    CacheEntry, CacheStatus, MediaKind, NavigationCursor, PlaybackStatus, SignedUrl, Story,
    StoryFeed, StoryGroup, StoryId, StoryRecord, UserId, ViewInsert,
};

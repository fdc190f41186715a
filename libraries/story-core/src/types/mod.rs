mod cache;
mod cursor;
mod ids;
mod playback;
mod story;
mod view;

pub use cache::{CacheEntry, CacheStatus, SignedUrl};
pub use cursor::NavigationCursor;
pub use ids::{StoryId, UserId};
pub use playback::PlaybackStatus;
pub use story::{MediaKind, Story, StoryFeed, StoryGroup, StoryRecord};
pub use view::ViewInsert;

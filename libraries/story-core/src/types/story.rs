/// Story domain types
use crate::error::{Result, StoryError};
use crate::types::{NavigationCursor, StoryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Media kind of a story, decided once when the record is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image shown for a fixed duration
    Image {
        /// Display duration in milliseconds (never zero)
        duration_ms: u64,
    },

    /// Video whose progress comes from the media player
    Video,
}

impl MediaKind {
    /// Display duration for image stories
    pub fn image_duration(&self) -> Option<Duration> {
        match self {
            Self::Image { duration_ms } => Some(Duration::from_millis(*duration_ms)),
            Self::Video => None,
        }
    }

    /// Whether progress is driven by the media player
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }

    /// Cache file extension used when the remote reference has none
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Image { .. } => "jpg",
            Self::Video => "mp4",
        }
    }
}

/// A single ephemeral media post
///
/// Immutable once fetched; identified by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub owner_id: UserId,
    pub kind: MediaKind,
    /// Object-store path used to request signed URLs
    pub remote_ref: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Story {
    /// Extension for the local cache file
    ///
    /// Taken from `remote_ref` when it carries a short alphanumeric extension,
    /// otherwise derived from the media kind.
    pub fn cache_extension(&self) -> String {
        let path = self.remote_ref.split(['?', '#']).next().unwrap_or_default();
        let file_name = path.rsplit('/').next().unwrap_or_default();

        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| {
                (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| self.kind.default_extension().to_string())
    }
}

/// Story row as delivered by the data-loading collaborator
///
/// The media type is a free-form string here; `into_story` resolves it into
/// a `MediaKind` so nothing downstream inspects strings again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: String,
    pub owner_id: String,
    pub media_type: String,
    pub remote_ref: String,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoryRecord {
    /// Convert into a typed `Story`
    ///
    /// Image stories without a positive duration get `default_image_duration`.
    pub fn into_story(self, default_image_duration: Duration) -> Result<Story> {
        if self.id.trim().is_empty() {
            return Err(StoryError::invalid_input("story id cannot be empty"));
        }

        let kind = match self.media_type.trim().to_ascii_lowercase().as_str() {
            "image" | "photo" => MediaKind::Image {
                duration_ms: self
                    .duration_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(default_image_duration.as_millis() as u64),
            },
            "video" => MediaKind::Video,
            other => {
                return Err(StoryError::invalid_input(format!(
                    "unknown media type '{}' for story {}",
                    other, self.id
                )))
            }
        };

        Ok(Story {
            id: StoryId::new(self.id),
            owner_id: UserId::new(self.owner_id),
            kind,
            remote_ref: self.remote_ref,
            caption: self.caption.filter(|c| !c.trim().is_empty()),
            created_at: self.created_at,
        })
    }
}

/// All stories belonging to one author, newest first as loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryGroup {
    pub owner_id: UserId,
    pub display_name: String,
    pub stories: Vec<Story>,
}

impl StoryGroup {
    pub fn new(owner_id: UserId, display_name: impl Into<String>, stories: Vec<Story>) -> Self {
        Self {
            owner_id,
            display_name: display_name.into(),
            stories,
        }
    }
}

/// Ordered, read-only list of story groups for one viewer session
///
/// Empty groups are dropped on construction, so every group holds at least
/// one story and any cursor produced by this type addresses a real story.
/// Deserialization goes through the same filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoryFeedRepr")]
pub struct StoryFeed {
    groups: Vec<StoryGroup>,
}

#[derive(Deserialize)]
struct StoryFeedRepr {
    #[serde(default)]
    groups: Vec<StoryGroup>,
}

impl From<StoryFeedRepr> for StoryFeed {
    fn from(repr: StoryFeedRepr) -> Self {
        Self::new(repr.groups)
    }
}

impl StoryFeed {
    pub fn new(groups: Vec<StoryGroup>) -> Self {
        Self {
            groups: groups
                .into_iter()
                .filter(|g| !g.stories.is_empty())
                .collect(),
        }
    }

    pub fn groups(&self) -> &[StoryGroup] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&StoryGroup> {
        self.groups.get(index)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_stories(&self) -> usize {
        self.groups.iter().map(|g| g.stories.len()).sum()
    }

    /// Story addressed by a cursor
    pub fn story_at(&self, cursor: NavigationCursor) -> Option<&Story> {
        self.groups
            .get(cursor.group_index)?
            .stories
            .get(cursor.story_index)
    }

    /// Whether the cursor addresses an existing story
    pub fn contains(&self, cursor: NavigationCursor) -> bool {
        self.story_at(cursor).is_some()
    }

    /// Cursor of the first story, if any
    pub fn first_cursor(&self) -> Option<NavigationCursor> {
        (!self.is_empty()).then(NavigationCursor::origin)
    }

    /// Cursor after `cursor`: next story in the group, else first story of
    /// the next group, else `None` at the very end.
    pub fn next_cursor(&self, cursor: NavigationCursor) -> Option<NavigationCursor> {
        let group = self.groups.get(cursor.group_index)?;
        if cursor.story_index + 1 < group.stories.len() {
            return Some(NavigationCursor::new(
                cursor.group_index,
                cursor.story_index + 1,
            ));
        }
        (cursor.group_index + 1 < self.groups.len())
            .then(|| NavigationCursor::new(cursor.group_index + 1, 0))
    }

    /// Cursor before `cursor`: previous story in the group, else last story
    /// of the previous group, else `None` at the very start.
    pub fn previous_cursor(&self, cursor: NavigationCursor) -> Option<NavigationCursor> {
        if cursor.story_index > 0 {
            return Some(NavigationCursor::new(
                cursor.group_index,
                cursor.story_index - 1,
            ));
        }
        let previous_group = cursor.group_index.checked_sub(1)?;
        let group = self.groups.get(previous_group)?;
        Some(NavigationCursor::new(
            previous_group,
            group.stories.len().saturating_sub(1),
        ))
    }

    /// Up to `count` stories following `cursor`, in navigation order
    pub fn upcoming(&self, cursor: NavigationCursor, count: usize) -> Vec<&Story> {
        let mut stories = Vec::with_capacity(count);
        let mut current = cursor;
        while stories.len() < count {
            let Some(next) = self.next_cursor(current) else {
                break;
            };
            if let Some(story) = self.story_at(next) {
                stories.push(story);
            }
            current = next;
        }
        stories
    }

    /// Leading stories of the first `groups` groups, `per_group` each
    pub fn leading_window(&self, groups: usize, per_group: usize) -> Vec<&Story> {
        self.groups
            .iter()
            .take(groups)
            .flat_map(|g| g.stories.iter().take(per_group))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, media_type: &str, duration_ms: Option<u64>) -> StoryRecord {
        StoryRecord {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            media_type: media_type.to_string(),
            remote_ref: format!("owner/{}.jpg", id),
            duration_ms,
            caption: None,
            created_at: Utc::now(),
        }
    }

    fn story(id: &str) -> Story {
        record(id, "image", Some(5000))
            .into_story(Duration::from_secs(5))
            .unwrap()
    }

    fn feed(sizes: &[usize]) -> StoryFeed {
        let groups = sizes
            .iter()
            .enumerate()
            .map(|(g, size)| {
                let stories = (0..*size).map(|s| story(&format!("g{}s{}", g, s))).collect();
                StoryGroup::new(UserId::new(format!("u{}", g)), format!("User {}", g), stories)
            })
            .collect();
        StoryFeed::new(groups)
    }

    #[test]
    fn image_record_keeps_positive_duration() {
        let story = record("s1", "image", Some(3000))
            .into_story(Duration::from_secs(5))
            .unwrap();
        assert_eq!(story.kind, MediaKind::Image { duration_ms: 3000 });
    }

    #[test]
    fn image_record_without_duration_uses_default() {
        let missing = record("s1", "image", None)
            .into_story(Duration::from_millis(4500))
            .unwrap();
        let zero = record("s2", "IMAGE", Some(0))
            .into_story(Duration::from_millis(4500))
            .unwrap();
        assert_eq!(missing.kind, MediaKind::Image { duration_ms: 4500 });
        assert_eq!(zero.kind, MediaKind::Image { duration_ms: 4500 });
    }

    #[test]
    fn video_record_becomes_video_kind() {
        let story = record("v1", "video", Some(12000))
            .into_story(Duration::from_secs(5))
            .unwrap();
        assert!(story.kind.is_video());
        assert_eq!(story.kind.image_duration(), None);
    }

    #[test]
    fn unknown_media_type_is_rejected() {
        let err = record("x", "audio", None)
            .into_story(Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, StoryError::InvalidInput(_)));
    }

    #[test]
    fn cache_extension_prefers_remote_ref() {
        let mut s = story("s1");
        s.remote_ref = "owner/clip.MOV?token=abc".to_string();
        assert_eq!(s.cache_extension(), "mov");

        s.remote_ref = "owner/no-extension".to_string();
        assert_eq!(s.cache_extension(), "jpg");

        s.remote_ref = "owner.dir/file".to_string();
        s.kind = MediaKind::Video;
        assert_eq!(s.cache_extension(), "mp4");
    }

    #[test]
    fn feed_drops_empty_groups() {
        let feed = feed(&[2, 0, 1]);
        assert_eq!(feed.group_count(), 2);
        assert_eq!(feed.total_stories(), 3);
    }

    #[test]
    fn next_cursor_crosses_groups_and_stops_at_end() {
        let feed = feed(&[2, 1]);
        let c = NavigationCursor::origin();
        let c = feed.next_cursor(c).unwrap();
        assert_eq!(c, NavigationCursor::new(0, 1));
        let c = feed.next_cursor(c).unwrap();
        assert_eq!(c, NavigationCursor::new(1, 0));
        assert_eq!(feed.next_cursor(c), None);
    }

    #[test]
    fn previous_cursor_lands_on_last_story_of_previous_group() {
        let feed = feed(&[3, 1]);
        let c = feed.previous_cursor(NavigationCursor::new(1, 0)).unwrap();
        assert_eq!(c, NavigationCursor::new(0, 2));
        assert_eq!(feed.previous_cursor(NavigationCursor::origin()), None);
    }

    #[test]
    fn upcoming_walks_across_groups() {
        let feed = feed(&[2, 2]);
        let ids: Vec<_> = feed
            .upcoming(NavigationCursor::new(0, 1), 5)
            .iter()
            .map(|s| s.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["g1s0", "g1s1"]);
    }

    #[test]
    fn leading_window_is_bounded() {
        let feed = feed(&[3, 3, 3, 3]);
        let window = feed.leading_window(2, 2);
        let ids: Vec<_> = window.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["g0s0", "g0s1", "g1s0", "g1s1"]);
    }

    #[test]
    fn empty_feed_has_no_cursor() {
        let feed = StoryFeed::new(vec![]);
        assert!(feed.is_empty());
        assert_eq!(feed.first_cursor(), None);
    }

    #[test]
    fn deserialized_feed_drops_empty_groups() {
        let original = feed(&[1, 2]);
        let mut value = serde_json::to_value(&original).unwrap();
        let groups = value["groups"].as_array_mut().unwrap();
        let empty = serde_json::json!({
            "owner_id": "nobody",
            "display_name": "Nobody",
            "stories": []
        });
        groups.insert(0, empty.clone());
        groups.insert(2, empty);

        let decoded: StoryFeed = serde_json::from_value(value).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.group_count(), 2);
        assert_eq!(decoded.first_cursor(), Some(NavigationCursor::origin()));
        assert_eq!(
            decoded.next_cursor(NavigationCursor::origin()),
            Some(NavigationCursor::new(1, 0))
        );
    }

    #[test]
    fn deserialized_feed_of_only_empty_groups_is_empty() {
        let decoded: StoryFeed = serde_json::from_str(
            r#"{"groups":[{"owner_id":"a","display_name":"A","stories":[]}]}"#,
        )
        .unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.first_cursor(), None);
    }
}

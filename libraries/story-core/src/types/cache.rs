/// Cache bookkeeping types
use crate::types::StoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolution status of a story's media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Resolution requested but not started
    Pending,
    /// Signed URL issued, bytes being fetched and written
    Downloading,
    /// Local file written and playable
    Ready,
    /// Localization failed; a fallback URI was handed out instead
    Failed,
}

/// Cache record keyed by story id
///
/// Keyed by id rather than URL: signed URLs expire and are re-issued without
/// invalidating a file already cached for the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub story_id: StoryId,
    pub status: CacheStatus,
    pub local_path: Option<PathBuf>,
    pub resolved_fallback_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn pending(story_id: StoryId) -> Self {
        Self {
            story_id,
            status: CacheStatus::Pending,
            local_path: None,
            resolved_fallback_url: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == CacheStatus::Ready && self.local_path.is_some()
    }
}

/// Time-limited URL issued by the remote object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SignedUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expires_at: None,
        }
    }

    /// Whether the URL is known to have expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn pending_entry_is_not_ready() {
        let entry = CacheEntry::pending(StoryId::new("s1"));
        assert_eq!(entry.status, CacheStatus::Pending);
        assert!(!entry.is_ready());
    }

    #[test]
    fn signed_url_expiry() {
        let now = Utc::now();
        let mut url = SignedUrl::new("https://cdn.example.com/a.jpg?token=1");
        assert!(!url.is_expired_at(now));

        url.expires_at = Some(now - Duration::seconds(1));
        assert!(url.is_expired_at(now));
    }
}

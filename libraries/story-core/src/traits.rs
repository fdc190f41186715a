/// Collaborator traits consumed by the engine
use crate::error::Result;
use crate::types::{SignedUrl, StoryId, UserId, ViewInsert};
use async_trait::async_trait;
use std::path::PathBuf;

/// Remote object store issuing time-limited signed URLs
///
/// URLs are re-issuable: signing the same reference twice is valid and the
/// engine never treats an expired URL as invalidating a cached file.
#[async_trait]
pub trait SigningService: Send + Sync {
    /// Issue a signed URL for an object-store reference
    ///
    /// # Errors
    /// Returns `StoryError::Signing` when the store refuses or is unreachable
    async fn sign(&self, remote_ref: &str) -> Result<SignedUrl>;
}

/// Fetches media bytes from a (signed) URL
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the full body at `url`
    ///
    /// # Errors
    /// Returns `StoryError::Download` on transport or status failures
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Local media cache keyed by story id
///
/// The extension parameter keeps the on-disk name type-appropriate so
/// platform players can sniff the container from the path.
#[async_trait]
pub trait LocalCacheStore: Send + Sync {
    /// Whether a complete file for this story is already cached
    async fn exists(&self, id: &StoryId, extension: &str) -> bool;

    /// Write media bytes for the story and return the final path
    ///
    /// # Errors
    /// Returns `StoryError::CacheWrite` when the file cannot be written
    async fn write(&self, id: &StoryId, extension: &str, bytes: &[u8]) -> Result<PathBuf>;

    /// Deterministic path for the story's cache file
    fn path_for(&self, id: &StoryId, extension: &str) -> PathBuf;
}

/// View-tracking backend with a uniqueness constraint on (viewer, story)
#[async_trait]
pub trait ViewBackend: Send + Sync {
    /// Insert a view record
    ///
    /// A uniqueness violation is reported as `Ok(ViewInsert::AlreadyExists)`.
    ///
    /// # Errors
    /// Returns `StoryError::ViewRecord` for any other backend failure
    async fn insert_view(&self, viewer: &UserId, story: &StoryId) -> Result<ViewInsert>;
}

/// Device media player driven by the engine
///
/// The player reports `PlaybackStatus` events back through the session; the
/// engine only issues commands through this trait.
pub trait MediaPlayer: Send {
    /// Load a playable URI, replacing whatever was loaded
    fn load(&mut self, uri: &str, looping: bool);

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback in place
    fn pause(&mut self);

    /// Seek back to the beginning
    fn seek_to_start(&mut self);

    /// Mute or unmute audio
    fn set_muted(&mut self, muted: bool);

    /// Release the loaded media
    fn unload(&mut self);
}

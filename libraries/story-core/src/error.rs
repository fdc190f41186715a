/// Core error types for the story viewer engine
use thiserror::Error;

/// Result type alias using `StoryError`
pub type Result<T> = std::result::Result<T, StoryError>;

/// Core error type for the story viewer engine
///
/// Cache and view-tracking failures are recovered inside their components and
/// never reach navigation. Only `PlaybackDecode` is user visible.
#[derive(Error, Debug)]
pub enum StoryError {
    /// The remote object store refused or failed to issue a signed URL
    #[error("Signing error: {0}")]
    Signing(String),

    /// Fetching media bytes from a signed URL failed
    #[error("Download error: {0}")]
    Download(String),

    /// Writing downloaded media into the local cache failed
    #[error("Cache write error: {0}")]
    CacheWrite(String),

    /// The media player could not decode or play the media
    #[error("Playback decode error: {0}")]
    PlaybackDecode(String),

    /// Transient failure of the view-tracking backend
    #[error("View record error: {0}")]
    ViewRecord(String),

    /// The view was already recorded by another code path or device
    #[error("View already recorded")]
    ViewRecordConflict,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl StoryError {
    /// Create a signing error
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create a download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Create a cache write error
    pub fn cache_write(msg: impl Into<String>) -> Self {
        Self::CacheWrite(msg.into())
    }

    /// Create a playback decode error
    pub fn playback_decode(msg: impl Into<String>) -> Self {
        Self::PlaybackDecode(msg.into())
    }

    /// Create a transient view record error
    pub fn view_record(msg: impl Into<String>) -> Self {
        Self::ViewRecord(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error is an expected outcome rather than a failure
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::ViewRecordConflict)
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for StoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::ViewRecordConflict,
            _ => Self::ViewRecord(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflict_is_benign() {
        assert!(StoryError::ViewRecordConflict.is_benign());
        assert!(!StoryError::view_record("timeout").is_benign());
        assert!(!StoryError::signing("403").is_benign());
        assert!(!StoryError::playback_decode("bad codec").is_benign());
    }

    #[test]
    fn messages_carry_context() {
        let err = StoryError::download("connection reset");
        assert_eq!(err.to_string(), "Download error: connection reset");
    }
}

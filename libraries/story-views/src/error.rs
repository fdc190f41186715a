/// View store errors
use thiserror::Error;

/// Result type alias using `ViewStoreError`
pub type Result<T> = std::result::Result<T, ViewStoreError>;

/// View store error types
#[derive(Error, Debug)]
pub enum ViewStoreError {
    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored row could not be interpreted
    #[error("Corrupt view row: {0}")]
    CorruptRow(String),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<ViewStoreError> for story_core::StoryError {
    fn from(err: ViewStoreError) -> Self {
        match err {
            // Keeps the unique-violation mapping to `ViewRecordConflict`
            ViewStoreError::Database(e) => story_core::StoryError::from(e),
            other => story_core::StoryError::view_record(other.to_string()),
        }
    }
}

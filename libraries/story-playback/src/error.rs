//! Error types for story navigation

use thiserror::Error;

/// Navigation errors
///
/// Cache and view-tracking failures never surface here; these are caller
/// mistakes against the navigation API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Group index past the end of the feed
    #[error("Group index {index} out of range ({count} groups)")]
    GroupOutOfRange { index: usize, count: usize },

    /// The feed has no stories
    #[error("Feed is empty")]
    EmptyFeed,

    /// The viewer was dismissed
    #[error("Viewer session closed")]
    SessionClosed,
}

/// Result type for navigation operations
pub type Result<T> = std::result::Result<T, NavigationError>;

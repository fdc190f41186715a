//! Error types for the story server client.

use story_core::StoryError;
use thiserror::Error;

/// Errors that can occur when talking to the story backend.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The row already exists (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ServerClientError {
    /// Map a transport error, separating unreachable servers from other failures
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ServerUnreachable(error.to_string())
        } else {
            Self::Request(error)
        }
    }

    /// Build the error for a non-success response
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        match status {
            401 | 403 => Self::AuthFailed(message),
            409 => Self::Conflict(message),
            _ => Self::ServerError { status, message },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Convert into the engine's signing failure
    pub fn into_signing(self) -> StoryError {
        StoryError::signing(self.to_string())
    }

    /// Convert into the engine's download failure
    pub fn into_download(self) -> StoryError {
        StoryError::download(self.to_string())
    }

    /// Convert into the engine's view-record failure
    ///
    /// Conflicts become `ViewRecordConflict`, which callers treat as success.
    pub fn into_view_record(self) -> StoryError {
        if self.is_conflict() {
            StoryError::ViewRecordConflict
        } else {
            StoryError::view_record(self.to_string())
        }
    }
}

/// Result type for server client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_benign_view_error() {
        let error = ServerClientError::Conflict("duplicate key".into()).into_view_record();
        assert!(error.is_benign());
    }

    #[test]
    fn server_error_maps_to_transient_view_error() {
        let error = ServerClientError::ServerError {
            status: 500,
            message: "boom".into(),
        }
        .into_view_record();
        assert!(matches!(error, StoryError::ViewRecord(msg) if msg.contains("500")));
    }

    #[test]
    fn signing_and_download_keep_the_message() {
        let signing = ServerClientError::AuthFailed("bad key".into()).into_signing();
        assert!(matches!(signing, StoryError::Signing(msg) if msg.contains("bad key")));

        let download = ServerClientError::ServerUnreachable("refused".into()).into_download();
        assert!(matches!(download, StoryError::Download(msg) if msg.contains("refused")));
    }
}

//! Types for the story backend's storage and REST endpoints.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connecting to the story backend.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the backend (e.g., "https://project.example.co")
    pub url: String,
    /// Project API key, sent on every request
    pub api_key: String,
    /// Signed-in user's access token; the API key is used when absent
    pub access_token: Option<String>,
    /// Storage bucket holding story media
    pub media_bucket: String,
    /// Lifetime requested for signed media URLs
    pub signed_url_ttl: Duration,
}

impl ServerConfig {
    /// Create a config with the default bucket and URL lifetime.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            access_token: None,
            media_bucket: "stories".to_string(),
            signed_url_ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_media_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.media_bucket = bucket.into();
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Token sent as the bearer credential
    pub(crate) fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }
}

// =============================================================================
// Storage Types
// =============================================================================

/// Request body for the object signing endpoint.
#[derive(Debug, Serialize)]
pub struct SignRequest {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

/// Response from the object signing endpoint.
///
/// `signed_url` is relative to the storage API root.
#[derive(Debug, Deserialize)]
pub struct SignResponse {
    #[serde(rename = "signedURL")]
    pub signed_url: String,
}

// =============================================================================
// View Types
// =============================================================================

/// Row inserted into the `story_views` table.
#[derive(Debug, Serialize)]
pub struct ViewRow<'a> {
    pub viewer_id: &'a str,
    pub story_id: &'a str,
}

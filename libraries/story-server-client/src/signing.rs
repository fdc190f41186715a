//! Signed URL issuance through the storage API.

use crate::client::StoryServerClient;
use crate::error::{Result, ServerClientError};
use crate::types::{SignRequest, SignResponse};
use async_trait::async_trait;
use chrono::Utc;
use story_core::{SignedUrl, SigningService};
use tracing::{debug, warn};

/// `SigningService` that asks the storage API for time-limited URLs
#[derive(Clone)]
pub struct HttpSigningService {
    client: StoryServerClient,
}

impl HttpSigningService {
    pub(crate) fn new(client: StoryServerClient) -> Self {
        Self { client }
    }

    /// Request a signed URL for `remote_ref` in the configured bucket.
    pub async fn sign_object(&self, remote_ref: &str) -> Result<SignedUrl> {
        let config = self.client.config();
        let segments = ["object", "sign", config.media_bucket.as_str()]
            .into_iter()
            .chain(remote_ref.split('/').filter(|s| !s.is_empty()));
        let url = self.client.endpoint("storage/v1", segments)?;
        let ttl = config.signed_url_ttl;

        debug!(remote_ref = %remote_ref, bucket = %config.media_bucket, "Signing media URL");

        let response = self
            .client
            .authorized(self.client.http().post(url))
            .json(&SignRequest {
                expires_in: ttl.as_secs(),
            })
            .send()
            .await
            .map_err(ServerClientError::from_transport)?;

        if !response.status().is_success() {
            let error = ServerClientError::from_response(response).await;
            warn!(remote_ref = %remote_ref, error = %error, "Signing request rejected");
            return Err(error);
        }

        let body: SignResponse = response.json().await.map_err(|e| {
            ServerClientError::ParseError(format!("Failed to parse signed URL: {}", e))
        })?;

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));

        Ok(SignedUrl {
            url: self.absolute(&body.signed_url),
            expires_at,
        })
    }

    /// Signed paths come back relative to the storage API root
    fn absolute(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            return signed.to_string();
        }
        let separator = if signed.starts_with('/') { "" } else { "/" };
        format!("{}/storage/v1{}{}", self.client.url(), separator, signed)
    }
}

#[async_trait]
impl SigningService for HttpSigningService {
    async fn sign(&self, remote_ref: &str) -> story_core::Result<SignedUrl> {
        self.sign_object(remote_ref)
            .await
            .map_err(ServerClientError::into_signing)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ServerConfig, StoryServerClient};

    #[test]
    fn relative_paths_join_the_storage_root() {
        let client =
            StoryServerClient::new(ServerConfig::new("https://example.com/", "key")).unwrap();
        let signing = client.signing();

        assert_eq!(
            signing.absolute("/object/sign/stories/a.jpg?token=t"),
            "https://example.com/storage/v1/object/sign/stories/a.jpg?token=t"
        );
        assert_eq!(
            signing.absolute("object/sign/stories/a.jpg?token=t"),
            "https://example.com/storage/v1/object/sign/stories/a.jpg?token=t"
        );
        assert_eq!(
            signing.absolute("https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }
}

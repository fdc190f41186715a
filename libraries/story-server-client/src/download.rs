//! Media downloads from signed URLs.

use crate::client::StoryServerClient;
use crate::error::{Result, ServerClientError};
use async_trait::async_trait;
use futures_util::StreamExt;
use story_core::MediaFetcher;
use tracing::{debug, info};

/// `MediaFetcher` that streams a signed URL into memory
#[derive(Clone)]
pub struct HttpMediaFetcher {
    client: StoryServerClient,
}

impl HttpMediaFetcher {
    pub(crate) fn new(client: StoryServerClient) -> Self {
        Self { client }
    }

    /// Download the full body at `url`.
    ///
    /// Signed URLs carry their own token, so no credentials are attached.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url = %url, "Downloading media");

        let response = self
            .client
            .http()
            .get(url)
            .send()
            .await
            .map_err(ServerClientError::from_transport)?;

        if !response.status().is_success() {
            return Err(ServerClientError::from_response(response).await);
        }

        let total_size = response.content_length();
        let capacity = total_size
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or_default();
        let mut body = Vec::with_capacity(capacity);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }

        info!(size = body.len(), expected = ?total_size, "Media downloaded");

        Ok(body)
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> story_core::Result<Vec<u8>> {
        self.download(url)
            .await
            .map_err(ServerClientError::into_download)
    }
}

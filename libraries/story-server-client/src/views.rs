//! View records through the REST API.

use crate::client::StoryServerClient;
use crate::error::{Result, ServerClientError};
use crate::types::ViewRow;
use async_trait::async_trait;
use story_core::{StoryId, UserId, ViewBackend, ViewInsert};
use tracing::debug;

/// `ViewBackend` that inserts into the remote `story_views` table
///
/// The table's unique `(viewer_id, story_id)` constraint answers with 409,
/// which is reported as `ViewInsert::AlreadyExists`.
#[derive(Clone)]
pub struct HttpViewBackend {
    client: StoryServerClient,
}

impl HttpViewBackend {
    pub(crate) fn new(client: StoryServerClient) -> Self {
        Self { client }
    }

    pub async fn insert(&self, viewer: &UserId, story: &StoryId) -> Result<ViewInsert> {
        let url = self.client.endpoint("rest/v1", ["story_views"])?;

        let response = self
            .client
            .authorized(self.client.http().post(url))
            .header("Prefer", "return=minimal")
            .json(&ViewRow {
                viewer_id: viewer.as_str(),
                story_id: story.as_str(),
            })
            .send()
            .await
            .map_err(ServerClientError::from_transport)?;

        if response.status().is_success() {
            debug!(viewer = %viewer, story_id = %story, "View inserted");
            return Ok(ViewInsert::Inserted);
        }

        match ServerClientError::from_response(response).await {
            ServerClientError::Conflict(_) => {
                debug!(viewer = %viewer, story_id = %story, "View already on record");
                Ok(ViewInsert::AlreadyExists)
            }
            error => Err(error),
        }
    }
}

#[async_trait]
impl ViewBackend for HttpViewBackend {
    async fn insert_view(&self, viewer: &UserId, story: &StoryId) -> story_core::Result<ViewInsert> {
        self.insert(viewer, story)
            .await
            .map_err(ServerClientError::into_view_record)
    }
}

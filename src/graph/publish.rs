use storypost_api_types::IdResponse;
use tracing::info;

use super::client::StoryPublisher;
use super::error::GraphError;
use crate::domain::{ContainerId, PostId};

impl StoryPublisher {
    /// Promote a processed container to a published story. Not retried.
    pub async fn publish_container(&self, container: &ContainerId) -> Result<PostId, GraphError> {
        let url = self.account_url("media_publish")?;
        let form = [("creation_id", container.as_str().to_string())];
        let published: IdResponse = self.graph.post_form(url, &form).await?;
        let post = PostId::new(published.id)?;
        info!(container_id = %container, story_id = %post, "story published");
        Ok(post)
    }
}

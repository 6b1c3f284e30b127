use clap::ValueEnum;
use serde::Deserialize;
use storypost_api_types::IdResponse;
use tracing::info;

use super::client::StoryPublisher;
use super::error::GraphError;
use crate::domain::{ContainerId, MediaKind};

/// Shape of the container creation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerStyle {
    /// Feed-style media flagged with `is_share_to_story`; videos go through the reels pipeline.
    #[default]
    ShareToStory,
    /// Native `STORIES` media type with `image_url` / `video_url`.
    Stories,
}

/// Form fields for `POST /{account}/media`.
pub fn container_form(
    media_url: &str,
    kind: MediaKind,
    style: ContainerStyle,
) -> Vec<(&'static str, String)> {
    let url = media_url.to_string();
    match (style, kind) {
        (ContainerStyle::ShareToStory, MediaKind::Image) => vec![
            ("media_type", "IMAGE".to_string()),
            ("media_url", url),
            ("is_share_to_story", "true".to_string()),
        ],
        (ContainerStyle::ShareToStory, MediaKind::Video) => vec![
            ("media_type", "REELS".to_string()),
            ("media_url", url.clone()),
            ("video_url", url),
            ("is_share_to_story", "true".to_string()),
        ],
        (ContainerStyle::Stories, MediaKind::Image) => vec![
            ("media_type", "STORIES".to_string()),
            ("image_url", url),
        ],
        (ContainerStyle::Stories, MediaKind::Video) => vec![
            ("media_type", "STORIES".to_string()),
            ("video_url", url),
        ],
    }
}

impl StoryPublisher {
    /// Create a media container for a publicly reachable URL.
    pub async fn create_container(
        &self,
        media_url: &str,
        kind: MediaKind,
    ) -> Result<ContainerId, GraphError> {
        let url = self.account_url("media")?;
        let form = container_form(media_url, kind, self.style);
        let created: IdResponse = self.graph.post_form(url, &form).await?;
        let container = ContainerId::new(created.id)?;
        info!(container_id = %container, kind = %kind, "media container created");
        Ok(container)
    }
}

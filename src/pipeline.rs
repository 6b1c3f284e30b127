//! The publishing pipelines: host a local file, then create, await and
//! publish a story container. Any failing step aborts the rest; nothing
//! already done remotely is rolled back.

use std::path::Path;

use tracing::info;

use crate::domain::{ContainerId, LocalMedia, MediaKind, PostId};
use crate::error::AppError;
use crate::github::{ContentHost, HostedMedia};
use crate::graph::{PollLimits, Readiness, StatusPolicy, StoryPublisher, wait_until_ready};

/// A story that made it all the way to publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedStory {
    pub container: ContainerId,
    pub post: PostId,
    /// Status requests made while waiting; zero when the check was skipped.
    pub status_checks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedStory {
    pub hosted: HostedMedia,
    pub story: PublishedStory,
}

/// Validate and read `path`, then upload it. Local checks run before any request.
pub async fn upload_file(
    host: &ContentHost,
    path: &Path,
    max_bytes: u64,
) -> Result<HostedMedia, AppError> {
    let media = LocalMedia::load(path, max_bytes).await?;
    Ok(host.upload(&media).await?)
}

/// Publish media that is already reachable at `media_url`.
pub async fn publish_story(
    publisher: &StoryPublisher,
    media_url: &str,
    kind: MediaKind,
    policy: StatusPolicy,
    limits: &PollLimits,
) -> Result<PublishedStory, AppError> {
    let container = publisher.create_container(media_url, kind).await?;

    let status_checks = match wait_until_ready(publisher, &container, Some(kind), policy, limits)
        .await?
    {
        Readiness::Ready { attempts } => attempts,
        Readiness::Failed { detail, .. } => {
            return Err(AppError::ProcessingFailed { container, detail });
        }
        Readiness::TimedOut { attempts, elapsed } => {
            return Err(AppError::TimedOut {
                container,
                attempts,
                elapsed,
            });
        }
    };

    let post = publisher.publish_container(&container).await?;
    Ok(PublishedStory {
        container,
        post,
        status_checks,
    })
}

/// Upload `path` to the content host and publish the hosted copy as a story.
pub async fn upload_and_publish(
    host: &ContentHost,
    publisher: &StoryPublisher,
    path: &Path,
    kind: MediaKind,
    max_bytes: u64,
    policy: StatusPolicy,
    limits: &PollLimits,
) -> Result<UploadedStory, AppError> {
    let hosted = upload_file(host, path, max_bytes).await?;
    info!(url = %hosted.download_url, "media hosted, creating story");
    let story = publish_story(publisher, &hosted.download_url, kind, policy, limits).await?;
    Ok(UploadedStory { hosted, story })
}

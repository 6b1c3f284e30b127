//! GitHub contents API used as a public media host.
//!
//! Uploads are create-or-replace: the object path is looked up first and, when a
//! file already exists there, its blob `sha` is sent back with the new
//! content as the overwrite precondition.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use storypost_api_types::{ContentsEntry, PutContentsRequest, PutContentsResponse};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::domain::{Credential, LocalMedia};
use crate::http::{EndpointError, RawResponse, endpoint, with_query};
use crate::util::bytes::format_bytes;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_DIRECTORY: &str = "media";

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("GitHub API error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("unexpected GitHub response: {body}")]
    UnexpectedBody { body: String },
    #[error("GitHub did not return a download URL for `{path}`")]
    MissingDownloadUrl { path: String },
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

impl GithubError {
    fn from_response(raw: &RawResponse) -> Self {
        GithubError::Api {
            status: raw.status.as_u16(),
            body: raw.text(),
        }
    }
}

/// `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected `owner/name`, got `{s}`")),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A file now publicly reachable on the content host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedMedia {
    pub download_url: String,
    /// Path inside the repository.
    pub path: String,
    /// Whether an existing object was overwritten.
    pub replaced: bool,
}

/// Where and as whom uploads are written.
#[derive(Debug, Clone)]
pub struct ContentHostTarget {
    pub api_base: Url,
    pub token: Credential,
    pub repo: RepoRef,
    pub branch: String,
    pub directory: String,
}

#[derive(Debug, Clone)]
pub struct ContentHost {
    http: Client,
    target: ContentHostTarget,
}

impl ContentHost {
    pub fn new(http: Client, target: ContentHostTarget) -> Self {
        Self { http, target }
    }

    /// Repository path for a file name, e.g. `media/photo.png`.
    pub fn object_path(&self, file_name: &str) -> String {
        let directory = self.target.directory.trim_matches('/');
        if directory.is_empty() {
            file_name.to_string()
        } else {
            format!("{directory}/{file_name}")
        }
    }

    fn contents_url(&self, object_path: &str) -> Result<Url, GithubError> {
        let repo = &self.target.repo;
        let segments = ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]
            .into_iter()
            .chain(object_path.split('/').filter(|segment| !segment.is_empty()));
        Ok(endpoint(&self.target.api_base, segments)?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, format!("token {}", self.target.token.expose()))
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
    }

    /// Revision token of the object at `object_path`, or `None` when absent.
    pub async fn current_revision(&self, object_path: &str) -> Result<Option<String>, GithubError> {
        let url = with_query(
            self.contents_url(object_path)?,
            &[("ref", self.target.branch.as_str())],
        );
        let resp = self.authorized(self.http.get(url)).send().await?;
        let raw = RawResponse::read(resp).await?;

        if raw.status == StatusCode::NOT_FOUND {
            debug!(path = object_path, "no existing object");
            return Ok(None);
        }
        if !raw.status.is_success() {
            return Err(GithubError::from_response(&raw));
        }
        let entry: ContentsEntry = serde_json::from_slice(&raw.body)
            .map_err(|_| GithubError::UnexpectedBody { body: raw.text() })?;
        debug!(path = object_path, sha = %entry.sha, "existing object found");
        Ok(Some(entry.sha))
    }

    /// Create or replace `object_path` with `media`, passing `sha` when replacing.
    pub async fn put(
        &self,
        object_path: &str,
        media: &LocalMedia,
        sha: Option<String>,
    ) -> Result<HostedMedia, GithubError> {
        let replaced = sha.is_some();
        let verb = if replaced { "Update" } else { "Upload" };
        let body = PutContentsRequest {
            message: format!("{verb} {} via storypost", media.file_name),
            content: BASE64.encode(&media.bytes),
            branch: self.target.branch.clone(),
            sha,
        };

        let url = self.contents_url(object_path)?;
        let resp = self.authorized(self.http.put(url)).json(&body).send().await?;
        let raw = RawResponse::read(resp).await?;
        if !raw.status.is_success() {
            return Err(GithubError::from_response(&raw));
        }

        let response: PutContentsResponse = serde_json::from_slice(&raw.body)
            .map_err(|_| GithubError::UnexpectedBody { body: raw.text() })?;
        let download_url = response
            .content
            .download_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GithubError::MissingDownloadUrl {
                path: object_path.to_string(),
            })?;

        Ok(HostedMedia {
            download_url,
            path: response.content.path.unwrap_or_else(|| object_path.to_string()),
            replaced,
        })
    }

    /// Upload `media` under the configured directory and return its public URL.
    pub async fn upload(&self, media: &LocalMedia) -> Result<HostedMedia, GithubError> {
        let object_path = self.object_path(&media.file_name);
        info!(
            file = %media.file_name,
            size = %format_bytes(media.size),
            repo = %self.target.repo,
            branch = %self.target.branch,
            "uploading to GitHub"
        );

        let sha = self.current_revision(&object_path).await?;
        let hosted = self.put(&object_path, media, sha).await?;
        info!(path = %hosted.path, replaced = hosted.replaced, "file uploaded");
        Ok(hosted)
    }
}

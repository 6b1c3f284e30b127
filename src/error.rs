use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::config::{LoadError, MissingSetting};
use crate::domain::{ContainerId, DomainError, MediaError};
use crate::github::GithubError;
use crate::graph::GraphError;
use crate::telemetry::TelemetryError;

/// Every way a command can fail. All of them end the process with status 1.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Missing(#[from] MissingSetting),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("upload failed: {0}")]
    Github(#[from] GithubError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("media processing failed for container {container}: {detail}")]
    ProcessingFailed {
        container: ContainerId,
        detail: String,
    },
    #[error(
        "container {container} was not ready after {attempts} status checks ({elapsed:?})"
    )]
    TimedOut {
        container: ContainerId,
        attempts: u32,
        elapsed: Duration,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to read input: {0}")]
    Prompt(#[from] io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        1
    }
}

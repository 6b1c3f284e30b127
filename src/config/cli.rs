use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::MediaKind;
use crate::graph::{ContainerStyle, UnknownStatus};

/// Command-line arguments for the storypost binary.
#[derive(Debug, Parser)]
#[command(
    name = "storypost",
    version,
    about = "Host local media on GitHub and publish it as an Instagram story"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "STORYPOST_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Exchange a short-lived user token for a long-lived one.
    #[command(name = "exchange-token")]
    ExchangeToken,
    /// Upload a file to the GitHub repository and print its public URL.
    Upload(UploadArgs),
    /// Publish already-hosted media as a story.
    Post(PostArgs),
    /// Upload a file, then publish it as a story.
    #[command(name = "upload-and-post")]
    UploadAndPost(UploadAndPostArgs),
}

#[derive(Debug, Args, Clone)]
pub struct UploadArgs {
    /// Local image or video to upload.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct PostArgs {
    /// Publicly reachable URL of the media.
    #[arg(value_name = "URL", value_hint = ValueHint::Url)]
    pub url: String,

    /// Media kind (IMAGE or VIDEO).
    #[arg(value_name = "KIND")]
    pub kind: MediaKind,
}

#[derive(Debug, Args, Clone)]
pub struct UploadAndPostArgs {
    /// Local image or video to upload.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Media kind (IMAGE or VIDEO).
    #[arg(value_name = "KIND")]
    pub kind: MediaKind,
}

/// Flags accepted by every command, layered over file and environment settings.
#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the Graph API base URL (including the version segment).
    #[arg(
        long = "graph-api-base",
        env = "STORYPOST_GRAPH_API_BASE",
        value_name = "URL",
        global = true
    )]
    pub graph_api_base: Option<String>,

    /// Long-lived Instagram access token.
    #[arg(
        long = "access-token",
        env = "INSTAGRAM_ACCESS_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub access_token: Option<String>,

    /// Instagram business account id.
    #[arg(
        long = "account-id",
        env = "INSTAGRAM_ACCOUNT_ID",
        value_name = "ID",
        global = true
    )]
    pub account_id: Option<String>,

    /// Facebook app id used for token exchange.
    #[arg(long = "app-id", env = "FACEBOOK_APP_ID", value_name = "ID", global = true)]
    pub app_id: Option<String>,

    /// Facebook app secret used for token exchange.
    #[arg(
        long = "app-secret",
        env = "FACEBOOK_APP_SECRET",
        value_name = "SECRET",
        hide_env_values = true,
        global = true
    )]
    pub app_secret: Option<String>,

    /// Short-lived user token to exchange.
    #[arg(
        long = "short-lived-token",
        env = "INSTAGRAM_SHORT_LIVED_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub short_lived_token: Option<String>,

    /// Shape of the story container request.
    #[arg(
        long = "container-style",
        env = "STORYPOST_CONTAINER_STYLE",
        value_name = "STYLE",
        value_enum,
        global = true
    )]
    pub container_style: Option<ContainerStyle>,

    /// Override the GitHub API base URL.
    #[arg(
        long = "github-api-base",
        env = "STORYPOST_GITHUB_API_BASE",
        value_name = "URL",
        global = true
    )]
    pub github_api_base: Option<String>,

    /// GitHub personal access token with contents write access.
    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub github_token: Option<String>,

    /// Repository that hosts uploads, as `owner/name`.
    #[arg(
        long = "github-repo",
        env = "GITHUB_REPO",
        value_name = "OWNER/NAME",
        global = true
    )]
    pub github_repo: Option<String>,

    /// Branch uploads are committed to.
    #[arg(
        long = "github-branch",
        env = "GITHUB_BRANCH",
        value_name = "BRANCH",
        global = true
    )]
    pub github_branch: Option<String>,

    /// Repository directory uploads are placed in.
    #[arg(long = "github-directory", value_name = "PATH", global = true)]
    pub github_directory: Option<String>,

    /// Seconds between container status polls.
    #[arg(long = "poll-interval-seconds", value_name = "SECONDS", global = true)]
    pub poll_interval_seconds: Option<u64>,

    /// Maximum number of container status polls.
    #[arg(long = "poll-max-attempts", value_name = "COUNT", global = true)]
    pub poll_max_attempts: Option<u64>,

    /// Overall time budget for container status polling.
    #[arg(long = "poll-deadline-seconds", value_name = "SECONDS", global = true)]
    pub poll_deadline_seconds: Option<u64>,

    /// How an unrecognised container status is treated.
    #[arg(long = "unknown-status", value_name = "POLICY", value_enum, global = true)]
    pub unknown_status: Option<UnknownStatus>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    num::{NonZeroU32, NonZeroU64},
    str::FromStr,
    time::Duration,
};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::{Credential, DEFAULT_MAX_UPLOAD_BYTES};
use crate::github::{
    ContentHostTarget, DEFAULT_BRANCH, DEFAULT_DIRECTORY, DEFAULT_GITHUB_API_BASE, RepoRef,
};
use crate::graph::{
    ContainerStyle, DEFAULT_GRAPH_API_BASE, PollLimits, StatusPolicy, TokenExchange,
    UnknownStatus,
    status::{DEFAULT_POLL_DEADLINE, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS},
};

mod cli;

pub use cli::{CliArgs, Command, Overrides, PostArgs, UploadAndPostArgs, UploadArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "storypost";
const ENV_PREFIX: &str = "STORYPOST";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub http: HttpSettings,
    pub graph: GraphSettings,
    pub github: GithubSettings,
    pub upload: UploadSettings,
    pub poll: PollSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub api_base: Url,
    pub access_token: Option<Credential>,
    pub account_id: Option<String>,
    pub app_id: Option<String>,
    pub app_secret: Option<Credential>,
    pub short_lived_token: Option<Credential>,
    pub container_style: ContainerStyle,
}

#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub api_base: Url,
    pub token: Option<Credential>,
    pub repo: Option<RepoRef>,
    pub branch: String,
    pub directory: String,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub limits: PollLimits,
    /// Explicit unknown-status treatment; each command has its own default.
    pub unknown_status: Option<UnknownStatus>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// A setting the running command needs but nobody supplied.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing required setting `{key}` (set {hint})")]
pub struct MissingSetting {
    pub key: &'static str,
    pub hint: &'static str,
}

impl MissingSetting {
    fn new(key: &'static str, hint: &'static str) -> Self {
        Self { key, hint }
    }
}

impl GraphSettings {
    /// Token and account required to create and publish containers.
    pub fn publishing_identity(&self) -> Result<(Credential, String), MissingSetting> {
        let token = self.access_token.clone().ok_or_else(|| {
            MissingSetting::new("graph.access_token", "INSTAGRAM_ACCESS_TOKEN or --access-token")
        })?;
        let account = self.account_id.clone().ok_or_else(|| {
            MissingSetting::new("graph.account_id", "INSTAGRAM_ACCOUNT_ID or --account-id")
        })?;
        Ok((token, account))
    }

    /// Token exchange inputs, or the first missing one.
    pub fn token_exchange(&self) -> Result<TokenExchange, MissingSetting> {
        let app_id = self.app_id.clone().ok_or_else(|| {
            MissingSetting::new("graph.app_id", "FACEBOOK_APP_ID or --app-id")
        })?;
        let app_secret = self.app_secret.clone().ok_or_else(|| {
            MissingSetting::new("graph.app_secret", "FACEBOOK_APP_SECRET or --app-secret")
        })?;
        let short_lived_token = self.short_lived_token.clone().ok_or_else(|| {
            MissingSetting::new(
                "graph.short_lived_token",
                "INSTAGRAM_SHORT_LIVED_TOKEN or --short-lived-token",
            )
        })?;
        Ok(TokenExchange {
            app_id,
            app_secret,
            short_lived_token,
        })
    }
}

impl GithubSettings {
    pub fn target(&self) -> Result<ContentHostTarget, MissingSetting> {
        let token = self
            .token
            .clone()
            .ok_or_else(|| MissingSetting::new("github.token", "GITHUB_TOKEN or --github-token"))?;
        let repo = self
            .repo
            .clone()
            .ok_or_else(|| MissingSetting::new("github.repo", "GITHUB_REPO or --github-repo"))?;
        Ok(ContentHostTarget {
            api_base: self.api_base.clone(),
            token,
            repo,
            branch: self.branch.clone(),
            directory: self.directory.clone(),
        })
    }
}

impl PollSettings {
    /// `base` with its unknown-status treatment replaced when one was configured.
    pub fn policy(&self, base: StatusPolicy) -> StatusPolicy {
        base.with_unknown(self.unknown_status)
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    http: RawHttpSettings,
    graph: RawGraphSettings,
    github: RawGithubSettings,
    upload: RawUploadSettings,
    poll: RawPollSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(base) = overrides.graph_api_base.as_ref() {
            self.graph.api_base = Some(base.clone());
        }
        if let Some(token) = overrides.access_token.as_ref() {
            self.graph.access_token = Some(token.clone());
        }
        if let Some(account) = overrides.account_id.as_ref() {
            self.graph.account_id = Some(account.clone());
        }
        if let Some(app_id) = overrides.app_id.as_ref() {
            self.graph.app_id = Some(app_id.clone());
        }
        if let Some(secret) = overrides.app_secret.as_ref() {
            self.graph.app_secret = Some(secret.clone());
        }
        if let Some(token) = overrides.short_lived_token.as_ref() {
            self.graph.short_lived_token = Some(token.clone());
        }
        if let Some(style) = overrides.container_style {
            self.graph.container_style = Some(style);
        }
        if let Some(base) = overrides.github_api_base.as_ref() {
            self.github.api_base = Some(base.clone());
        }
        if let Some(token) = overrides.github_token.as_ref() {
            self.github.token = Some(token.clone());
        }
        if let Some(repo) = overrides.github_repo.as_ref() {
            self.github.repo = Some(repo.clone());
        }
        if let Some(branch) = overrides.github_branch.as_ref() {
            self.github.branch = Some(branch.clone());
        }
        if let Some(directory) = overrides.github_directory.as_ref() {
            self.github.directory = Some(directory.clone());
        }
        if let Some(seconds) = overrides.poll_interval_seconds {
            self.poll.interval_seconds = Some(seconds);
        }
        if let Some(attempts) = overrides.poll_max_attempts {
            self.poll.max_attempts = Some(attempts);
        }
        if let Some(seconds) = overrides.poll_deadline_seconds {
            self.poll.deadline_seconds = Some(seconds);
        }
        if let Some(policy) = overrides.unknown_status {
            self.poll.unknown_status = Some(policy);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            http,
            graph,
            github,
            upload,
            poll,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            http: build_http_settings(http)?,
            graph: build_graph_settings(graph)?,
            github: build_github_settings(github)?,
            upload: build_upload_settings(upload)?,
            poll: build_poll_settings(poll)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_http_settings(http: RawHttpSettings) -> Result<HttpSettings, LoadError> {
    let seconds = http.timeout_seconds.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Ok(HttpSettings {
        timeout: non_zero_seconds(seconds, "http.timeout_seconds")?,
    })
}

fn build_graph_settings(graph: RawGraphSettings) -> Result<GraphSettings, LoadError> {
    let api_base = parse_base_url(
        graph.api_base.as_deref().unwrap_or(DEFAULT_GRAPH_API_BASE),
        "graph.api_base",
    )?;

    Ok(GraphSettings {
        api_base,
        access_token: graph.access_token.and_then(Credential::new),
        account_id: non_blank(graph.account_id),
        app_id: non_blank(graph.app_id),
        app_secret: graph.app_secret.and_then(Credential::new),
        short_lived_token: graph.short_lived_token.and_then(Credential::new),
        container_style: graph.container_style.unwrap_or_default(),
    })
}

fn build_github_settings(github: RawGithubSettings) -> Result<GithubSettings, LoadError> {
    let api_base = parse_base_url(
        github.api_base.as_deref().unwrap_or(DEFAULT_GITHUB_API_BASE),
        "github.api_base",
    )?;

    let repo = non_blank(github.repo)
        .map(|value| RepoRef::from_str(&value))
        .transpose()
        .map_err(|reason| LoadError::invalid("github.repo", reason))?;

    let branch = non_blank(github.branch).unwrap_or_else(|| DEFAULT_BRANCH.to_string());
    let directory = github
        .directory
        .map(|value| value.trim().trim_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_DIRECTORY.to_string());

    Ok(GithubSettings {
        api_base,
        token: github.token.and_then(Credential::new),
        repo,
        branch,
        directory,
    })
}

fn build_upload_settings(upload: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let max_bytes = upload.max_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
    let max_bytes = NonZeroU64::new(max_bytes)
        .ok_or_else(|| LoadError::invalid("upload.max_bytes", "must be greater than zero"))?;
    Ok(UploadSettings { max_bytes })
}

fn build_poll_settings(poll: RawPollSettings) -> Result<PollSettings, LoadError> {
    let interval = match poll.interval_seconds {
        Some(seconds) => non_zero_seconds(seconds, "poll.interval_seconds")?,
        None => DEFAULT_POLL_INTERVAL,
    };
    let deadline = match poll.deadline_seconds {
        Some(seconds) => non_zero_seconds(seconds, "poll.deadline_seconds")?,
        None => DEFAULT_POLL_DEADLINE,
    };
    let max_attempts = non_zero_u32(
        poll.max_attempts
            .unwrap_or(u64::from(DEFAULT_POLL_MAX_ATTEMPTS)),
        "poll.max_attempts",
    )?;

    Ok(PollSettings {
        limits: PollLimits {
            interval,
            max_attempts,
            deadline,
        },
        unknown_status: poll.unknown_status,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHttpSettings {
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGraphSettings {
    api_base: Option<String>,
    access_token: Option<String>,
    account_id: Option<String>,
    app_id: Option<String>,
    app_secret: Option<String>,
    short_lived_token: Option<String>,
    container_style: Option<ContainerStyle>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGithubSettings {
    api_base: Option<String>,
    token: Option<String>,
    repo: Option<String>,
    branch: Option<String>,
    directory: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    max_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPollSettings {
    interval_seconds: Option<u64>,
    max_attempts: Option<u64>,
    deadline_seconds: Option<u64>,
    unknown_status: Option<UnknownStatus>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_base_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, format!("`{value}` is not an http(s) base URL")));
    }
    Ok(url)
}

fn non_zero_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

//! Command runners: wire settings into clients and print results on stdout.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use reqwest::Client;
use tracing::{info, warn};

use crate::config::{Command, GraphSettings, Settings};
use crate::domain::{Credential, MediaKind};
use crate::error::AppError;
use crate::github::ContentHost;
use crate::graph::{GraphClient, StatusPolicy, StoryPublisher};
use crate::http::build_client;
use crate::pipeline::{self, PublishedStory};

const STORY_LIFETIME_NOTE: &str = "stories expire after 24 hours";

pub async fn run(command: Command, settings: Settings) -> Result<(), AppError> {
    let http = build_client(settings.http.timeout).map_err(AppError::HttpClient)?;

    match command {
        Command::ExchangeToken => exchange_token(http, settings).await,
        Command::Upload(args) => upload(http, &settings, &args.file).await,
        Command::Post(args) => post(http, &settings, &args.url, args.kind).await,
        Command::UploadAndPost(args) => {
            upload_and_post(http, &settings, &args.file, args.kind).await
        }
    }
}

async fn exchange_token(http: Client, mut settings: Settings) -> Result<(), AppError> {
    if io::stdin().is_terminal() {
        prompt_for_missing(&mut settings.graph)?;
    }
    let exchange = settings.graph.token_exchange()?;

    let graph = GraphClient::new(http, settings.graph.api_base.clone());
    let token = graph.exchange_token(&exchange).await?;

    println!("{}", token.access_token.expose());
    match token.validity_days() {
        Some(days) => eprintln!("token is valid for about {days:.0} days"),
        None => eprintln!("token service did not report an expiry"),
    }
    eprintln!("store it as INSTAGRAM_ACCESS_TOKEN");
    Ok(())
}

fn prompt_for_missing(graph: &mut GraphSettings) -> Result<(), AppError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    if graph.app_id.is_none() {
        graph.app_id = prompt(&mut input, "Facebook app id")?;
    }
    if graph.app_secret.is_none() {
        graph.app_secret = prompt(&mut input, "Facebook app secret")?.and_then(Credential::new);
    }
    if graph.short_lived_token.is_none() {
        graph.short_lived_token =
            prompt(&mut input, "Short-lived user token")?.and_then(Credential::new);
    }
    Ok(())
}

fn prompt(input: &mut impl BufRead, label: &str) -> io::Result<Option<String>> {
    let mut stderr = io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let value = line.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn content_host(http: Client, settings: &Settings) -> Result<ContentHost, AppError> {
    Ok(ContentHost::new(http, settings.github.target()?))
}

fn story_publisher(http: Client, settings: &Settings) -> Result<StoryPublisher, AppError> {
    let (token, account) = settings.graph.publishing_identity()?;
    let graph = GraphClient::new(http, settings.graph.api_base.clone());
    Ok(StoryPublisher::new(
        graph,
        token,
        account,
        settings.graph.container_style,
    ))
}

async fn upload(http: Client, settings: &Settings, file: &Path) -> Result<(), AppError> {
    let host = content_host(http, settings)?;
    let hosted = pipeline::upload_file(&host, file, settings.upload.max_bytes.get()).await?;
    println!("{}", hosted.download_url);
    Ok(())
}

async fn post(
    http: Client,
    settings: &Settings,
    media_url: &str,
    kind: MediaKind,
) -> Result<(), AppError> {
    if !media_url.starts_with("https://") {
        warn!(url = media_url, "media URL is not https; the Graph API may refuse it");
    }
    let publisher = story_publisher(http, settings)?;
    let policy = settings.poll.policy(StatusPolicy::STRICT);
    let story =
        pipeline::publish_story(&publisher, media_url, kind, policy, &settings.poll.limits)
            .await?;
    report_story(&story);
    Ok(())
}

async fn upload_and_post(
    http: Client,
    settings: &Settings,
    file: &Path,
    kind: MediaKind,
) -> Result<(), AppError> {
    let host = content_host(http.clone(), settings)?;
    let publisher = story_publisher(http, settings)?;
    let policy = settings.poll.policy(StatusPolicy::LENIENT);

    let uploaded = pipeline::upload_and_publish(
        &host,
        &publisher,
        file,
        kind,
        settings.upload.max_bytes.get(),
        policy,
        &settings.poll.limits,
    )
    .await?;

    println!("hosted at: {}", uploaded.hosted.download_url);
    report_story(&uploaded.story);
    Ok(())
}

fn report_story(story: &PublishedStory) {
    info!(
        container_id = %story.container,
        story_id = %story.post,
        status_checks = story.status_checks,
        "story is live"
    );
    println!("story id: {}", story.post);
    println!("{STORY_LIFETIME_NOTE}");
}

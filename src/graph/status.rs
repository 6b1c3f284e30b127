//! Container status polling.
//!
//! Processing is reported by the remote service as a status tag on the
//! container node. The poll is a bounded loop: it stops on a terminal tag, on
//! the attempt limit, or when the next attempt would start past the overall
//! deadline.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use storypost_api_types::ContainerStatusResponse;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::client::StoryPublisher;
use super::error::GraphError;
use crate::domain::{ContainerId, MediaKind};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(600);

/// Remote processing state of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Finished,
    InProgress,
    Failed,
    /// Any other tag, or none at all.
    Unknown(Option<String>),
}

impl ContainerStatus {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("FINISHED") => ContainerStatus::Finished,
            Some("IN_PROGRESS") => ContainerStatus::InProgress,
            Some("FAILED") => ContainerStatus::Failed,
            other => ContainerStatus::Unknown(other.map(str::to_string)),
        }
    }
}

/// One status observation.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: ContainerStatus,
    /// Whether the response carried the container id.
    pub identified: bool,
    /// Response body exactly as received, kept for failure reports.
    pub raw: String,
}

impl StatusReport {
    pub fn from_response(response: &ContainerStatusResponse, raw: String) -> Self {
        Self {
            status: ContainerStatus::from_code(response.status_code.as_deref()),
            identified: response.id.as_deref().is_some_and(|id| !id.is_empty()),
            raw,
        }
    }
}

/// How an unrecognised or missing status tag is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownStatus {
    Fail,
    /// Treat as ready when the response still identifies the container.
    ProceedIfIdentified,
}

/// Which containers are polled and how unknown tags are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    pub skip_images: bool,
    pub unknown: UnknownStatus,
}

impl StatusPolicy {
    /// Poll every container; unknown tags fail.
    pub const STRICT: Self = Self {
        skip_images: false,
        unknown: UnknownStatus::Fail,
    };

    /// Image containers are ready immediately; unknown tags pass when identified.
    pub const LENIENT: Self = Self {
        skip_images: true,
        unknown: UnknownStatus::ProceedIfIdentified,
    };

    #[must_use]
    pub fn with_unknown(self, unknown: Option<UnknownStatus>) -> Self {
        Self {
            unknown: unknown.unwrap_or(self.unknown),
            ..self
        }
    }
}

/// Bounds on the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollLimits {
    pub interval: Duration,
    pub max_attempts: NonZeroU32,
    pub deadline: Duration,
}

impl Default for PollLimits {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: NonZeroU32::new(DEFAULT_POLL_MAX_ATTEMPTS).unwrap_or(NonZeroU32::MIN),
            deadline: DEFAULT_POLL_DEADLINE,
        }
    }
}

/// Final outcome of waiting on a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32 },
    Failed { attempts: u32, detail: String },
    TimedOut { attempts: u32, elapsed: Duration },
}

/// Source of container status observations.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, container: &ContainerId) -> Result<StatusReport, GraphError>;
}

#[async_trait]
impl StatusSource for StoryPublisher {
    async fn fetch_status(&self, container: &ContainerId) -> Result<StatusReport, GraphError> {
        let url = self.graph.url(
            &[container.as_str()],
            &[
                ("fields", "id,status_code"),
                ("access_token", self.access_token.expose()),
            ],
        )?;
        let (response, raw): (ContainerStatusResponse, String) =
            self.graph.get_json_verbatim(url).await?;
        Ok(StatusReport::from_response(&response, raw))
    }
}

/// Wait until `container` is publishable, has failed, or the limits run out.
///
/// Transport and API errors from a single status request abort the wait.
pub async fn wait_until_ready<S>(
    source: &S,
    container: &ContainerId,
    kind: Option<MediaKind>,
    policy: StatusPolicy,
    limits: &PollLimits,
) -> Result<Readiness, GraphError>
where
    S: StatusSource + ?Sized,
{
    if policy.skip_images && kind == Some(MediaKind::Image) {
        info!(container_id = %container, "image container needs no processing check");
        return Ok(Readiness::Ready { attempts: 0 });
    }

    let started = Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        let report = source.fetch_status(container).await?;
        debug!(container_id = %container, attempt = attempts, status = ?report.status, "container status");

        match &report.status {
            ContainerStatus::Finished => {
                info!(container_id = %container, attempts, "media is ready for publishing");
                return Ok(Readiness::Ready { attempts });
            }
            ContainerStatus::Failed => {
                warn!(container_id = %container, response = %report.raw, "media processing failed");
                return Ok(Readiness::Failed {
                    attempts,
                    detail: report.raw,
                });
            }
            ContainerStatus::Unknown(code) => {
                let code = code.clone();
                return Ok(judge_unknown(container, code.as_deref(), report, policy, attempts));
            }
            ContainerStatus::InProgress => {}
        }

        let elapsed = started.elapsed();
        if attempts >= limits.max_attempts.get() || elapsed + limits.interval > limits.deadline {
            warn!(container_id = %container, attempts, elapsed = ?elapsed, "gave up waiting for media processing");
            return Ok(Readiness::TimedOut { attempts, elapsed });
        }

        info!(container_id = %container, attempt = attempts, "media is still processing, waiting");
        sleep(limits.interval).await;
    }
}

fn judge_unknown(
    container: &ContainerId,
    code: Option<&str>,
    report: StatusReport,
    policy: StatusPolicy,
    attempts: u32,
) -> Readiness {
    warn!(container_id = %container, status = ?code, response = %report.raw, "unrecognised container status");
    match policy.unknown {
        UnknownStatus::ProceedIfIdentified if report.identified => {
            info!(container_id = %container, "container is identified, proceeding");
            Readiness::Ready { attempts }
        }
        _ => Readiness::Failed {
            attempts,
            detail: format!(
                "unrecognised status {}: {}",
                code.unwrap_or("<missing>"),
                report.raw
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use httpmock::MockServer;

    use super::*;
    use crate::graph::test_support::publisher;

    /// Replays a fixed list of statuses, repeating the last one.
    struct Scripted {
        statuses: Mutex<VecDeque<ContainerStatus>>,
        identified: bool,
        calls: AtomicU32,
        fetched_at: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        /// `identified` is whether each response carries the container id.
        fn new(statuses: &[ContainerStatus], identified: bool) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().cloned().collect()),
                identified,
                calls: AtomicU32::new(0),
                fetched_at: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        async fn fetch_status(&self, _container: &ContainerId) -> Result<StatusReport, GraphError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.fetched_at.lock().expect("lock").push(Instant::now());
            let mut statuses = self.statuses.lock().expect("lock");
            let status = if statuses.len() > 1 {
                statuses.pop_front().expect("status")
            } else {
                statuses.front().cloned().expect("status")
            };
            Ok(StatusReport {
                status,
                identified: self.identified,
                raw: "{}".to_string(),
            })
        }
    }

    fn container() -> ContainerId {
        ContainerId::new("17895").expect("id")
    }

    fn limits(max_attempts: u32) -> PollLimits {
        PollLimits {
            interval: Duration::from_secs(5),
            max_attempts: NonZeroU32::new(max_attempts).expect("non-zero"),
            deadline: Duration::from_secs(3600),
        }
    }

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(ContainerStatus::from_code(Some("FINISHED")), ContainerStatus::Finished);
        assert_eq!(ContainerStatus::from_code(Some("IN_PROGRESS")), ContainerStatus::InProgress);
        assert_eq!(ContainerStatus::from_code(Some("FAILED")), ContainerStatus::Failed);
        assert_eq!(
            ContainerStatus::from_code(Some("EXPIRED")),
            ContainerStatus::Unknown(Some("EXPIRED".into()))
        );
        assert_eq!(ContainerStatus::from_code(None), ContainerStatus::Unknown(None));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_returns_without_further_requests() {
        let source = Scripted::new(&[ContainerStatus::Finished], true);
        let outcome = wait_until_ready(&source, &container(), None, StatusPolicy::STRICT, &limits(10))
            .await
            .expect("poll");
        assert_eq!(outcome, Readiness::Ready { attempts: 1 });
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_returns_without_further_requests() {
        let source = Scripted::new(&[ContainerStatus::Failed], true);
        let outcome = wait_until_ready(&source, &container(), None, StatusPolicy::STRICT, &limits(10))
            .await
            .expect("poll");
        assert!(matches!(outcome, Readiness::Failed { attempts: 1, .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_progress_waits_one_interval_then_polls_once_more() {
        let source = Scripted::new(&[ContainerStatus::InProgress, ContainerStatus::Finished], true);
        let outcome = wait_until_ready(&source, &container(), None, StatusPolicy::STRICT, &limits(10))
            .await
            .expect("poll");
        assert_eq!(outcome, Readiness::Ready { attempts: 2 });
        assert_eq!(source.calls(), 2);

        let fetched = source.fetched_at.lock().expect("lock");
        let gap = fetched[1] - fetched[0];
        assert!(gap >= Duration::from_secs(5), "gap was {gap:?}");
        assert!(gap < Duration::from_secs(6), "gap was {gap:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn endless_processing_times_out_at_attempt_limit() {
        let source = Scripted::new(&[ContainerStatus::InProgress], true);
        let outcome = wait_until_ready(&source, &container(), None, StatusPolicy::STRICT, &limits(4))
            .await
            .expect("poll");
        assert!(matches!(outcome, Readiness::TimedOut { attempts: 4, .. }));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn overall_deadline_stops_polling() {
        let source = Scripted::new(&[ContainerStatus::InProgress], true);
        let bounded = PollLimits {
            deadline: Duration::from_secs(12),
            ..limits(100)
        };
        let outcome = wait_until_ready(&source, &container(), None, StatusPolicy::STRICT, &bounded)
            .await
            .expect("poll");
        // Attempts at 0s, 5s and 10s; a fourth would start at 15s.
        match outcome {
            Readiness::TimedOut { attempts, elapsed } => {
                assert_eq!(attempts, 3);
                assert!(elapsed <= Duration::from_secs(12));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_fails_under_strict_policy() {
        let source = Scripted::new(&[ContainerStatus::Unknown(None)], true);
        let outcome = wait_until_ready(&source, &container(), None, StatusPolicy::STRICT, &limits(10))
            .await
            .expect("poll");
        assert!(matches!(outcome, Readiness::Failed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_proceeds_when_identified_under_lenient_policy() {
        let source = Scripted::new(&[ContainerStatus::Unknown(Some("PUBLISHED".into()))], true);
        let outcome = wait_until_ready(
            &source,
            &container(),
            Some(MediaKind::Video),
            StatusPolicy::LENIENT,
            &limits(10),
        )
        .await
        .expect("poll");
        assert_eq!(outcome, Readiness::Ready { attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_fails_under_lenient_policy_without_id() {
        let source = Scripted::new(&[ContainerStatus::Unknown(None)], false);
        let outcome = wait_until_ready(
            &source,
            &container(),
            Some(MediaKind::Video),
            StatusPolicy::LENIENT,
            &limits(10),
        )
        .await
        .expect("poll");
        assert!(matches!(outcome, Readiness::Failed { attempts: 1, .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lenient_policy_skips_image_containers() {
        let source = Scripted::new(&[ContainerStatus::Failed], true);
        let outcome = wait_until_ready(
            &source,
            &container(),
            Some(MediaKind::Image),
            StatusPolicy::LENIENT,
            &limits(10),
        )
        .await
        .expect("poll");
        assert_eq!(outcome, Readiness::Ready { attempts: 0 });
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn unknown_override_replaces_policy_default() {
        let policy = StatusPolicy::LENIENT.with_unknown(Some(UnknownStatus::Fail));
        assert!(policy.skip_images);
        assert_eq!(policy.unknown, UnknownStatus::Fail);
        assert_eq!(StatusPolicy::STRICT.with_unknown(None), StatusPolicy::STRICT);
    }

    #[tokio::test]
    async fn publisher_requests_status_fields() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/17895")
                .query_param("fields", "id,status_code")
                .query_param("access_token", "ig-token");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"17895","status_code":"FINISHED"}"#);
        });

        let outcome = wait_until_ready(
            &publisher(&server),
            &container(),
            Some(MediaKind::Video),
            StatusPolicy::STRICT,
            &limits(3),
        )
        .await
        .expect("poll");
        assert_eq!(outcome, Readiness::Ready { attempts: 1 });
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn publisher_stops_after_remote_failure() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/17895");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"17895","status_code":"FAILED"}"#);
        });

        let outcome = wait_until_ready(
            &publisher(&server),
            &container(),
            Some(MediaKind::Video),
            StatusPolicy::STRICT,
            &limits(3),
        )
        .await
        .expect("poll");
        assert!(matches!(outcome, Readiness::Failed { attempts: 1, .. }));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn publisher_polls_until_attempts_run_out() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/17895");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"17895","status_code":"IN_PROGRESS"}"#);
        });

        let fast = PollLimits {
            interval: Duration::from_millis(10),
            max_attempts: NonZeroU32::new(3).expect("non-zero"),
            deadline: Duration::from_secs(30),
        };
        let outcome = wait_until_ready(
            &publisher(&server),
            &container(),
            Some(MediaKind::Video),
            StatusPolicy::STRICT,
            &fast,
        )
        .await
        .expect("poll");
        assert!(matches!(outcome, Readiness::TimedOut { attempts: 3, .. }));
        mock.assert_calls(3);
    }

    #[tokio::test]
    async fn publisher_proceeds_on_missing_status_when_identified() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/17895");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"17895"}"#);
        });

        let outcome = wait_until_ready(
            &publisher(&server),
            &container(),
            Some(MediaKind::Video),
            StatusPolicy::LENIENT,
            &limits(3),
        )
        .await
        .expect("poll");
        assert_eq!(outcome, Readiness::Ready { attempts: 1 });
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn failure_detail_is_the_body_as_received() {
        let body = r#"{"status_code":"FAILED","id":"17895","status":"Error: media could not be fetched"}"#;
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/17895");
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        });

        let outcome = wait_until_ready(
            &publisher(&server),
            &container(),
            Some(MediaKind::Video),
            StatusPolicy::STRICT,
            &limits(3),
        )
        .await
        .expect("poll");
        assert_eq!(
            outcome,
            Readiness::Failed {
                attempts: 1,
                detail: body.to_string(),
            }
        );
    }
}

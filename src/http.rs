//! Shared outbound HTTP plumbing for the Graph and GitHub clients.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("base URL `{0}` cannot carry a path")]
    CannotBeABase(String),
}

pub fn user_agent() -> &'static str {
    concat!("storypost/", env!("CARGO_PKG_VERSION"))
}

/// Build the client shared by every request of a command run.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent())
        .timeout(timeout)
        .build()
}

/// Append `segments` to the path of `base`, percent-encoding each segment.
pub fn endpoint<I>(base: &Url, segments: I) -> Result<Url, EndpointError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| EndpointError::CannotBeABase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn with_query(mut url: Url, query: &[(&str, &str)]) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    url
}

/// Status plus raw body, read before any decoding so error bodies survive verbatim.
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub async fn read(resp: Response) -> Result<Self, reqwest::Error> {
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        Ok(Self { status, body })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_versioned_base_path() {
        let base = Url::parse("https://graph.facebook.com/v19.0").expect("url");
        let url = endpoint(&base, ["1784", "media"]).expect("endpoint");
        assert_eq!(url.as_str(), "https://graph.facebook.com/v19.0/1784/media");

        let slashed = Url::parse("https://graph.facebook.com/v19.0/").expect("url");
        let url = endpoint(&slashed, ["1784", "media_publish"]).expect("endpoint");
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v19.0/1784/media_publish"
        );
    }

    #[test]
    fn endpoint_encodes_each_segment() {
        let base = Url::parse("http://127.0.0.1:8080").expect("url");
        let url = endpoint(&base, ["contents", "my photo#1.png"]).expect("endpoint");
        assert_eq!(url.path(), "/contents/my%20photo%231.png");
    }

    #[test]
    fn query_pairs_are_appended() {
        let base = Url::parse("https://api.github.com/repos/o/r").expect("url");
        let url = with_query(base, &[("ref", "main"), ("x", "a b")]);
        assert_eq!(url.query(), Some("ref=main&x=a+b"));
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(user_agent().starts_with("storypost/"));
    }
}

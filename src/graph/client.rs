use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::container::ContainerStyle;
use super::error::GraphError;
use crate::domain::Credential;
use crate::http::{RawResponse, endpoint, with_query};

/// Unauthenticated handle on the Graph API; operations that need a user token
/// go through [`StoryPublisher`].
#[derive(Clone, Debug)]
pub struct GraphClient {
    http: Client,
    base: Url,
}

impl GraphClient {
    pub fn new(http: Client, base: Url) -> Self {
        Self { http, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, GraphError> {
        let url = endpoint(&self.base, segments)?;
        Ok(with_query(url, query))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GraphError> {
        let resp = self.http.get(url).send().await?;
        Self::decode(RawResponse::read(resp).await?)
    }

    /// Like [`get_json`](Self::get_json), also returning the body text as received.
    pub(crate) async fn get_json_verbatim<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<(T, String), GraphError> {
        let resp = self.http.get(url).send().await?;
        let raw = RawResponse::read(resp).await?;
        let text = raw.text();
        Ok((Self::decode(raw)?, text))
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &[(&str, String)],
    ) -> Result<T, GraphError> {
        let resp = self.http.post(url).form(form).send().await?;
        Self::decode(RawResponse::read(resp).await?)
    }

    fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<T, GraphError> {
        if !raw.status.is_success() {
            return Err(GraphError::from_response(&raw));
        }
        serde_json::from_slice(&raw.body).map_err(|_| GraphError::UnexpectedBody { body: raw.text() })
    }
}

/// Graph API operations performed on behalf of one Instagram business account.
#[derive(Clone, Debug)]
pub struct StoryPublisher {
    pub(crate) graph: GraphClient,
    pub(crate) access_token: Credential,
    pub(crate) account_id: String,
    pub(crate) style: ContainerStyle,
}

impl StoryPublisher {
    pub fn new(
        graph: GraphClient,
        access_token: Credential,
        account_id: impl Into<String>,
        style: ContainerStyle,
    ) -> Self {
        Self {
            graph,
            access_token,
            account_id: account_id.into(),
            style,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn style(&self) -> ContainerStyle {
        self.style
    }

    /// URL under the account node, e.g. `/{account}/media`, carrying the access token.
    pub(crate) fn account_url(&self, edge: &str) -> Result<Url, GraphError> {
        self.graph.url(
            &[self.account_id.as_str(), edge],
            &[("access_token", self.access_token.expose())],
        )
    }
}

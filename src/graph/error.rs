use storypost_api_types::GraphErrorEnvelope;
use thiserror::Error;

use crate::domain::DomainError;
use crate::http::{EndpointError, RawResponse};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("graph API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected graph API response: {body}")]
    UnexpectedBody { body: String },
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

impl From<reqwest::Error> for GraphError {
    // Access tokens travel in the query string; keep them out of error text.
    fn from(err: reqwest::Error) -> Self {
        GraphError::Transport(err.without_url())
    }
}

impl From<DomainError> for GraphError {
    fn from(err: DomainError) -> Self {
        GraphError::UnexpectedBody {
            body: err.to_string(),
        }
    }
}

impl GraphError {
    /// Build an API error from a non-success response, preferring the structured
    /// Graph error message over the raw body.
    pub(crate) fn from_response(raw: &RawResponse) -> Self {
        let message = serde_json::from_slice::<GraphErrorEnvelope>(&raw.body)
            .map(|envelope| envelope.error.to_string())
            .unwrap_or_else(|_| raw.text());
        GraphError::Api {
            status: raw.status.as_u16(),
            message,
        }
    }
}

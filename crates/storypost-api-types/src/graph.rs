use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `GET /oauth/access_token` with `grant_type=fb_exchange_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Remaining validity in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Any Graph response whose only interesting field is the created object id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

/// Body of `GET /{container-id}?fields=id,status_code`.
///
/// Both fields are optional: image story containers are often returned
/// without a `status_code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatusResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphErrorEnvelope {
    pub error: GraphErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphErrorBody {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

impl fmt::Display for GraphErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        match (&self.kind, self.code) {
            (Some(kind), Some(code)) => write!(f, " ({kind}, code {code})")?,
            (Some(kind), None) => write!(f, " ({kind})")?,
            (None, Some(code)) => write!(f, " (code {code})")?,
            (None, None) => {}
        }
        if let Some(subcode) = self.error_subcode {
            write!(f, " subcode {subcode}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_response_tolerates_missing_fields() {
        let parsed: ContainerStatusResponse =
            serde_json::from_str(r#"{"id":"17895"}"#).expect("parse");
        assert_eq!(parsed.id.as_deref(), Some("17895"));
        assert!(parsed.status_code.is_none());
    }

    #[test]
    fn error_body_renders_type_and_code() {
        let envelope: GraphErrorEnvelope = serde_json::from_str(
            r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190,"fbtrace_id":"A1"}}"#,
        )
        .expect("parse");
        assert_eq!(
            envelope.error.to_string(),
            "Invalid OAuth access token. (OAuthException, code 190)"
        );
    }

    #[test]
    fn token_response_without_expiry() {
        let parsed: TokenExchangeResponse =
            serde_json::from_str(r#"{"access_token":"long","token_type":"bearer"}"#)
                .expect("parse");
        assert_eq!(parsed.access_token, "long");
        assert_eq!(parsed.expires_in, None);
    }
}

use serde::{Deserialize, Serialize};

/// A file entry from `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentsEntry {
    /// Blob revision; must be echoed back to overwrite the file.
    pub sha: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutContentsRequest {
    pub message: String,
    /// Base64-encoded file bytes.
    pub content: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutContentsResponse {
    pub content: ContentsEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_request_omits_absent_sha() {
        let body = PutContentsRequest {
            message: "Upload photo.png".into(),
            content: "AAAA".into(),
            branch: "master".into(),
            sha: None,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert!(value.get("sha").is_none());
        assert_eq!(value["branch"], "master");
    }

    #[test]
    fn put_request_carries_revision() {
        let body = PutContentsRequest {
            message: "Update photo.png".into(),
            content: "AAAA".into(),
            branch: "master".into(),
            sha: Some("abc123".into()),
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["sha"], "abc123");
    }
}

use std::fmt;

/// Opaque bearer secret (access token, app secret, personal access token).
///
/// `Debug` is redacted so settings and errors can be logged freely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret, trimming surrounding whitespace. Returns `None` when blank.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Result of exchanging a short-lived token.
#[derive(Debug, Clone)]
pub struct LongLivedToken {
    pub access_token: Credential,
    /// Validity reported by the token service, in seconds.
    pub expires_in: Option<u64>,
}

impl LongLivedToken {
    #[allow(clippy::cast_precision_loss)]
    pub fn validity_days(&self) -> Option<f64> {
        self.expires_in
            .map(|seconds| seconds as f64 / SECONDS_PER_DAY)
    }
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{entity} identifier must not be empty")]
    EmptyIdentifier { entity: &'static str },
    #[error("unknown media kind `{value}` (expected IMAGE or VIDEO)")]
    UnknownMediaKind { value: String },
}

impl DomainError {
    pub fn empty_identifier(entity: &'static str) -> Self {
        Self::EmptyIdentifier { entity }
    }

    pub fn unknown_media_kind(value: impl Into<String>) -> Self {
        Self::UnknownMediaKind {
            value: value.into(),
        }
    }
}

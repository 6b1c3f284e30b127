//! Remote identifiers. Both are copied verbatim between requests and never
//! interpreted locally; the only invariant is that they are non-empty.

use std::fmt;

use super::error::DomainError;

macro_rules! remote_id {
    ($name:ident, $entity:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::empty_identifier($entity));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

remote_id!(ContainerId, "media container");
remote_id!(PostId, "published story");

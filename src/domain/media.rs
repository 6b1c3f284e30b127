use std::fmt;
use std::str::FromStr;

use super::error::DomainError;

/// Kind of media being published; parsed case-insensitively from `IMAGE` / `VIDEO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "IMAGE",
            MediaKind::Video => "VIDEO",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IMAGE" => Ok(MediaKind::Image),
            "VIDEO" => Ok(MediaKind::Video),
            _ => Err(DomainError::unknown_media_kind(s)),
        }
    }
}

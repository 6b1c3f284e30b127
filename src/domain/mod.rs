//! Domain types: credentials, media kinds, remote identifiers and local media files.

pub mod credential;
pub mod error;
pub mod ids;
pub mod media;
pub mod uploads;

pub use credential::{Credential, LongLivedToken};
pub use error::DomainError;
pub use ids::{ContainerId, PostId};
pub use media::MediaKind;
pub use uploads::{DEFAULT_MAX_UPLOAD_BYTES, LocalMedia, MediaError};

//! Local media files and the checks they must pass before anything is sent.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

/// Largest file the content host accepts (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("file not found at `{}`", .path.display())]
    NotFound { path: PathBuf },
    #[error("`{}` is not a regular file", .path.display())]
    NotAFile { path: PathBuf },
    #[error("`{}` is {size} bytes, over the {limit} byte upload limit", .path.display())]
    TooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },
    #[error("`{}` has no usable file name", .path.display())]
    NoFileName { path: PathBuf },
    #[error("failed to read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A validated local file held fully in memory.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl LocalMedia {
    /// Validate `path` against `max_bytes` and read it.
    ///
    /// Existence, file type and size are checked from metadata before the
    /// contents are read, so oversized files are never loaded.
    pub async fn load(path: &Path, max_bytes: u64) -> Result<Self, MediaError> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(MediaError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(MediaError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if !metadata.is_file() {
            return Err(MediaError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        check_size(path, metadata.len(), max_bytes)?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MediaError::NoFileName {
                path: path.to_path_buf(),
            })?
            .to_string();

        let bytes = fs::read(path).await.map_err(|source| MediaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // The file may have grown between the metadata call and the read.
        let size = bytes.len() as u64;
        check_size(path, size, max_bytes)?;

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size,
            bytes,
        })
    }
}

fn check_size(path: &Path, size: u64, limit: u64) -> Result<(), MediaError> {
    if size > limit {
        return Err(MediaError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, tempdir};

    use super::*;

    fn media_file(len: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tmp file");
        file.write_all(&vec![0xAB; len]).expect("write tmp");
        file
    }

    #[tokio::test]
    async fn loads_small_file() {
        let file = media_file(10 * 1024);
        let media = LocalMedia::load(file.path(), DEFAULT_MAX_UPLOAD_BYTES)
            .await
            .expect("load");
        assert_eq!(media.size, 10 * 1024);
        assert_eq!(media.bytes.len(), 10 * 1024);
        assert!(!media.file_name.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let dir = tempdir().expect("tmp dir");
        let err = LocalMedia::load(&dir.path().join("nope.png"), DEFAULT_MAX_UPLOAD_BYTES)
            .await
            .expect_err("missing file");
        assert!(matches!(err, MediaError::NotFound { .. }));
    }

    #[tokio::test]
    async fn directories_are_rejected() {
        let dir = tempdir().expect("tmp dir");
        let err = LocalMedia::load(dir.path(), DEFAULT_MAX_UPLOAD_BYTES)
            .await
            .expect_err("directory");
        assert!(matches!(err, MediaError::NotAFile { .. }));
    }

    #[tokio::test]
    async fn file_over_limit_is_rejected() {
        let file = media_file(16);
        let err = LocalMedia::load(file.path(), 15)
            .await
            .expect_err("too large");
        assert!(matches!(
            err,
            MediaError::TooLarge {
                size: 16,
                limit: 15,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn file_at_limit_is_accepted() {
        let file = media_file(16);
        let media = LocalMedia::load(file.path(), 16).await.expect("load");
        assert_eq!(media.size, 16);
    }

    #[tokio::test]
    async fn default_limit_is_one_hundred_mebibytes() {
        let file = NamedTempFile::new().expect("tmp file");
        file.as_file()
            .set_len(DEFAULT_MAX_UPLOAD_BYTES + 1)
            .expect("grow sparse file");
        let err = LocalMedia::load(file.path(), DEFAULT_MAX_UPLOAD_BYTES)
            .await
            .expect_err("too large");
        assert!(matches!(err, MediaError::TooLarge { .. }));
    }
}

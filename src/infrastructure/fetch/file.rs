//! Local file fetcher.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::ImageSource;
use crate::domain::errors::FetchError;
use crate::domain::ports::Fetcher;

/// Reads `LocalFile` sources from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl FileFetcher {
    /// Creates a new file fetcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Reads a whole file, mapping a missing file to `FetchError::NotFound`.
pub(super) async fn read_file(path: &std::path::Path) -> Result<Bytes, FetchError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Bytes::from(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FetchError::not_found(path.display().to_string()))
        }
        Err(e) => Err(FetchError::io(format!("{}: {e}", path.display()))),
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, source: &ImageSource) -> Result<Bytes, FetchError> {
        match source {
            ImageSource::LocalFile(path) => read_file(path).await,
            other => Err(FetchError::UnsupportedSource {
                kind: other.kind().to_string(),
            }),
        }
    }
}

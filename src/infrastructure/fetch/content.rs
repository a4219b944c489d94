//! Content handle fetcher.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::ImageSource;
use crate::domain::errors::FetchError;
use crate::domain::ports::Fetcher;

use super::file::read_file;

/// Resolves opaque content handles to bytes.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Opens the content behind `handle`.
    async fn open(&self, handle: &str) -> Result<Bytes, FetchError>;
}

/// Resolves `file://` handles; declines every other scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileUriResolver;

#[async_trait]
impl ContentResolver for FileUriResolver {
    async fn open(&self, handle: &str) -> Result<Bytes, FetchError> {
        match handle.strip_prefix("file://") {
            Some(path) => read_file(Path::new(path)).await,
            None => Err(FetchError::declined(format!(
                "no content resolver for `{handle}`"
            ))),
        }
    }
}

/// Fetches `ContentHandle` sources through a [`ContentResolver`].
#[derive(Clone)]
pub struct ContentFetcher {
    resolver: Arc<dyn ContentResolver>,
}

impl ContentFetcher {
    /// Creates a fetcher backed by `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn ContentResolver>) -> Self {
        Self { resolver }
    }
}

impl Default for ContentFetcher {
    fn default() -> Self {
        Self::new(Arc::new(FileUriResolver))
    }
}

#[async_trait]
impl Fetcher for ContentFetcher {
    async fn fetch(&self, source: &ImageSource) -> Result<Bytes, FetchError> {
        match source {
            ImageSource::ContentHandle(handle) => self.resolver.open(handle).await,
            other => Err(FetchError::UnsupportedSource {
                kind: other.kind().to_string(),
            }),
        }
    }
}

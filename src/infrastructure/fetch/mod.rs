//! Source fetchers and their dispatch by source kind.

mod content;
mod file;
mod http;
mod resource;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::ImageSource;
use crate::domain::errors::FetchError;
use crate::domain::ports::Fetcher;

pub use content::{ContentFetcher, ContentResolver, FileUriResolver};
pub use file::FileFetcher;
pub use http::{DEFAULT_TIMEOUT, HttpFetcher};
pub use resource::{ResourceFetcher, ResourceTable};

/// One fetcher per source kind.
#[derive(Clone)]
pub struct FetcherSet {
    http: Arc<dyn Fetcher>,
    file: Arc<dyn Fetcher>,
    content: Arc<dyn Fetcher>,
    resource: Arc<dyn Fetcher>,
}

impl FetcherSet {
    /// Creates the standard fetchers.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        Ok(Self {
            http: Arc::new(HttpFetcher::new(timeout, user_agent)?),
            file: Arc::new(FileFetcher::new()),
            content: Arc::new(ContentFetcher::default()),
            resource: Arc::new(ResourceFetcher::default()),
        })
    }

    /// Replaces the `RemoteUrl` fetcher.
    #[must_use]
    pub fn with_http(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.http = fetcher;
        self
    }

    /// Replaces the `LocalFile` fetcher.
    #[must_use]
    pub fn with_file(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.file = fetcher;
        self
    }

    /// Replaces the `ContentHandle` fetcher.
    #[must_use]
    pub fn with_content(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.content = fetcher;
        self
    }

    /// Replaces the `Resource` fetcher.
    #[must_use]
    pub fn with_resource(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.resource = fetcher;
        self
    }

    /// Selects the fetcher for a source.
    #[must_use]
    pub fn for_source(&self, source: &ImageSource) -> &Arc<dyn Fetcher> {
        match source {
            ImageSource::RemoteUrl(_) => &self.http,
            ImageSource::LocalFile(_) => &self.file,
            ImageSource::ContentHandle(_) => &self.content,
            ImageSource::Resource(_) => &self.resource,
        }
    }
}

impl std::fmt::Debug for FetcherSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherSet").finish_non_exhaustive()
    }
}

#[async_trait]
impl Fetcher for FetcherSet {
    async fn fetch(&self, source: &ImageSource) -> Result<Bytes, FetchError> {
        self.for_source(source).fetch(source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockFetcher;

    fn serving(body: &'static [u8]) -> Arc<MockFetcher> {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(move |_| Ok(Bytes::from_static(body)));
        Arc::new(fetcher)
    }

    #[tokio::test]
    async fn test_dispatch_by_source_kind() {
        let set = FetcherSet::new(DEFAULT_TIMEOUT, "lumen-test")
            .unwrap()
            .with_http(serving(b"http"))
            .with_file(serving(b"file"))
            .with_content(serving(b"content"))
            .with_resource(serving(b"res"));

        let cases = [
            (ImageSource::url("https://x/a.png"), &b"http"[..]),
            (ImageSource::LocalFile("/tmp/a.png".into()), &b"file"[..]),
            (ImageSource::ContentHandle("content://media/1".into()), &b"content"[..]),
            (ImageSource::Resource(3), &b"res"[..]),
        ];
        for (source, expected) in cases {
            let bytes = set.fetch(&source).await.unwrap();
            assert_eq!(&bytes[..], expected, "{source}");
        }
    }
}

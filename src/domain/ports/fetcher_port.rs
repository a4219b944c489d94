//! Fetcher port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::ImageSource;
use crate::domain::errors::FetchError;

/// Retrieves the raw bytes of a source.
///
/// A fetcher is selected by source kind; it may reject kinds it does not serve
/// with `FetchError::UnsupportedSource`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the bytes for `source`.
    async fn fetch(&self, source: &ImageSource) -> Result<Bytes, FetchError>;
}

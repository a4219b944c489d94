use super::{CacheError, FetchError};

/// Errors raised while assembling a [`Lumen`](crate::application::Lumen) instance.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LumenError {
    /// The disk cache could not be opened.
    #[error("failed to open disk cache: {0}")]
    Cache(#[from] CacheError),
    /// The default fetchers could not be built.
    #[error("failed to build fetchers: {0}")]
    Fetch(#[from] FetchError),
}

//! States emitted by an image load.

use std::sync::Arc;

use crate::domain::errors::LoadError;

use super::cache_key::FullKey;

/// Where the bytes behind a successful load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Decoded image served from the memory cache.
    Memory,
    /// Raw bytes read from the disk cache.
    Disk,
    /// Raw bytes retrieved by a fetcher.
    Fetched,
}

impl std::fmt::Display for LoadOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
            Self::Fetched => write!(f, "fetched"),
        }
    }
}

/// A decoded, fully processed image ready for display.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Memory cache key of the image.
    pub key: FullKey,
    /// The image itself.
    pub image: Arc<image::DynamicImage>,
    /// Where the underlying bytes came from.
    pub origin: LoadOrigin,
}

/// Progress and result of one load.
///
/// Every load ends in exactly one terminal state: `Success`, `Error` or `Fallback`.
#[derive(Debug, Clone)]
pub enum ImageState {
    /// The image is not in memory and is being loaded.
    Loading,
    /// The image is ready.
    Success(LoadedImage),
    /// A stage failed.
    Error(LoadError),
    /// A collaborator declined to produce the image; the caller should
    /// render its own substitute.
    Fallback(String),
}

impl ImageState {
    /// Returns true for `Success`, `Error` and `Fallback`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Returns true while loading.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if the image is ready.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the loaded image, if any.
    #[must_use]
    pub const fn loaded(&self) -> Option<&LoadedImage> {
        match self {
            Self::Success(loaded) => Some(loaded),
            _ => None,
        }
    }

    /// Returns the error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LoadError> for ImageState {
    fn from(err: LoadError) -> Self {
        if err.is_fallback() {
            Self::Fallback(err.to_string())
        } else {
            Self::Error(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{DecodeError, FetchError};

    #[test]
    fn test_terminal_states() {
        assert!(!ImageState::Loading.is_terminal());
        assert!(ImageState::Fallback("gone".into()).is_terminal());
        assert!(ImageState::Error(DecodeError::malformed("bad").into()).is_terminal());
    }

    #[test]
    fn test_soft_failures_become_fallback() {
        let state = ImageState::from(LoadError::from(FetchError::declined("no such resource")));
        assert!(matches!(state, ImageState::Fallback(_)));

        let state = ImageState::from(LoadError::from(FetchError::not_found("res:9")));
        assert!(state.error().is_some());
    }
}

//! Cache error types.

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors raised by the cache tiers.
///
/// The load pipeline absorbs these; they only reach callers that use a cache directly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// Cache directory could not be determined or created.
    #[error("cache directory unavailable: {0}")]
    DirUnavailable(String),
}

//! Port definitions for the two cache tiers.

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::entities::{FullKey, RawKey};
use crate::domain::errors::CacheResult;

/// Port for the decoded-image (memory) cache, keyed by full key.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Attempts to get an image from the cache, refreshing its recency.
    /// Returns None if not cached.
    async fn get(&self, key: &FullKey) -> Option<Arc<image::DynamicImage>>;

    /// Stores an image in the cache, evicting others if needed.
    async fn put(&self, key: FullKey, image: Arc<image::DynamicImage>);

    /// Removes an image from the cache.
    async fn remove(&self, key: &FullKey);

    /// Clears all images from the cache.
    async fn clear(&self);

    /// Returns the current number of cached images.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the summed byte size of cached images.
    fn size(&self) -> u64;

    /// Returns the byte capacity.
    fn max_size(&self) -> u64;
}

/// Port for the raw-bytes (disk) cache, keyed by raw key.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait ByteCachePort: Send + Sync {
    /// Reads the bytes stored for a key. Read failures count as misses.
    async fn get(&self, key: &RawKey) -> Option<Bytes>;

    /// Stores bytes under a key, evicting older entries to make room.
    async fn put(&self, key: &RawKey, bytes: &[u8]) -> CacheResult<()>;

    /// Removes the entry for a key.
    async fn remove(&self, key: &RawKey);

    /// Removes every entry.
    async fn clear(&self) -> CacheResult<()>;

    /// Returns the summed byte size of stored entries.
    async fn size(&self) -> u64;

    /// Returns the byte budget.
    fn max_size(&self) -> u64;
}

//! In-memory LRU cache of decoded images, bounded by pixel-buffer bytes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::FullKey;
use crate::domain::ports::ImageCachePort;
use crate::infrastructure::system::detect_total_memory;

/// Byte footprint of an image's pixel buffer (width x height x bytes per pixel).
#[must_use]
pub fn image_size(image: &image::DynamicImage) -> u64 {
    u64::from(image.width())
        * u64::from(image.height())
        * u64::from(image.color().bytes_per_pixel())
}

/// Default capacity: one eighth of system memory.
#[must_use]
pub fn default_max_size() -> u64 {
    detect_total_memory() / 8
}

struct Entry {
    image: Arc<image::DynamicImage>,
    size: u64,
}

struct Inner {
    entries: LruCache<FullKey, Entry>,
    size: u64,
}

/// In-memory LRU cache for decoded images.
///
/// The sum of entry sizes stays within `max_size`, except that an entry larger
/// than the whole budget is still admitted (it displaces everything else).
pub struct MemoryImageCache {
    inner: RwLock<Inner>,
    max_size: u64,
    current_size: AtomicU64,
    entry_count: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a new cache holding at most `max_size` bytes of pixels.
    #[must_use]
    pub fn new(max_size: u64) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: LruCache::unbounded(),
                size: 0,
            }),
            max_size,
            current_size: AtomicU64::new(0),
            entry_count: AtomicUsize::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a new cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(default_max_size())
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: self.entry_count.load(Ordering::Relaxed),
            size: self.current_size.load(Ordering::Relaxed),
            max_size: self.max_size,
        }
    }

    /// Peeks at an image without promoting it in the LRU.
    pub async fn peek(&self, key: &FullKey) -> Option<Arc<image::DynamicImage>> {
        let inner = self.inner.read().await;
        inner.entries.peek(key).map(|entry| entry.image.clone())
    }

    /// Returns true if the key is cached, without promoting it.
    pub async fn contains(&self, key: &FullKey) -> bool {
        self.inner.read().await.entries.contains(key)
    }

    fn publish(&self, inner: &Inner) {
        self.current_size.store(inner.size, Ordering::Relaxed);
        self.entry_count.store(inner.entries.len(), Ordering::Relaxed);
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for MemoryImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageCache")
            .field("max_size", &self.max_size)
            .field("size", &self.current_size.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub entries: usize,
    /// Current size in bytes.
    pub size: u64,
    /// Capacity in bytes.
    pub max_size: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {}/{} bytes, {:.1}% hit rate ({} hits, {} misses)",
            self.entries, self.size, self.max_size, self.hit_rate, self.hits, self.misses
        )
    }
}

#[async_trait::async_trait]
impl ImageCachePort for MemoryImageCache {
    async fn get(&self, key: &FullKey) -> Option<Arc<image::DynamicImage>> {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache hit");
            Some(entry.image.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    async fn put(&self, key: FullKey, image: Arc<image::DynamicImage>) {
        let size = image_size(&image);
        let mut inner = self.inner.write().await;

        if let Some(previous) = inner.entries.put(key.clone(), Entry { image, size }) {
            inner.size -= previous.size;
        }
        inner.size += size;
        debug!(key = %key, size, "Storing image in memory cache");

        // The entry just written is most recent, so it is only reached once it is alone.
        while inner.size > self.max_size && inner.entries.len() > 1 {
            let Some((evicted, entry)) = inner.entries.pop_lru() else {
                break;
            };
            inner.size -= entry.size;
            debug!(key = %evicted, size = entry.size, "Evicted image from memory cache");
        }

        self.publish(&inner);
    }

    async fn remove(&self, key: &FullKey) {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.entries.pop(key) {
            inner.size -= entry.size;
            self.publish(&inner);
            debug!(key = %key, "Removed image from memory cache");
        }
    }

    async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.size = 0;
        self.publish(&inner);
        debug!("Cleared memory image cache");
    }

    fn len(&self) -> usize {
        self.entry_count.load(Ordering::Relaxed)
    }

    fn size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    fn max_size(&self) -> u64 {
        self.max_size
    }
}

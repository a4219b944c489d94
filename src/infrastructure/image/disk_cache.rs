//! Disk-based cache of raw source bytes, persisted across sessions.
//!
//! One file per raw key, named by [`RawKey::file_name`]. Recency is tracked in
//! an in-process index (access time per key, and the reverse map from file
//! name to key); files the index does not know fall back to their
//! modification time, which `get` refreshes so recency survives restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::domain::entities::RawKey;
use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::ports::ByteCachePort;

/// Default disk cache budget in bytes (50 MiB).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 50 * 1024 * 1024;

/// Suffix of in-progress writes.
const PARTIAL_EXT: &str = "part";

/// Size and recency bookkeeping.
///
/// `sizes` lists every blob on disk and `total` is their sum. The recency
/// maps cover the subset whose key is known to this process.
#[derive(Debug, Default)]
struct Index {
    sizes: HashMap<String, u64>,
    total: u64,
    access_times: HashMap<RawKey, SystemTime>,
    file_to_key: HashMap<String, RawKey>,
    last_stamp: Option<SystemTime>,
}

impl Index {
    /// Records an access and returns its stamp. Stamps strictly increase.
    fn touch(&mut self, key: &RawKey, file_name: String) -> SystemTime {
        let now = SystemTime::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::from_nanos(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        self.access_times.insert(key.clone(), stamp);
        self.file_to_key.insert(file_name, key.clone());
        stamp
    }

    fn last_access(&self, file_name: &str) -> Option<SystemTime> {
        self.file_to_key
            .get(file_name)
            .and_then(|key| self.access_times.get(key))
            .copied()
    }

    /// Sets the size of a blob now on disk, replacing any previous size.
    fn set_size(&mut self, file_name: &str, len: u64) {
        let old = self.sizes.insert(file_name.to_string(), len).unwrap_or(0);
        self.total = self.total - old + len;
    }

    /// Drops the size of a blob no longer on disk. Idempotent.
    fn drop_size(&mut self, file_name: &str) {
        if let Some(old) = self.sizes.remove(file_name) {
            self.total -= old;
        }
    }

    /// Replaces the sizes with what a directory scan found.
    fn resync_sizes(&mut self, on_disk: &HashMap<String, u64>) {
        self.sizes.clone_from(on_disk);
        self.total = self.sizes.values().sum();
    }

    fn forget_file(&mut self, file_name: &str) {
        self.drop_size(file_name);
        if let Some(key) = self.file_to_key.remove(file_name) {
            self.access_times.remove(&key);
        }
    }

    fn forget_key(&mut self, key: &RawKey, file_name: &str) {
        self.drop_size(file_name);
        self.forget_recency(key, file_name);
    }

    fn forget_recency(&mut self, key: &RawKey, file_name: &str) {
        self.access_times.remove(key);
        self.file_to_key.remove(file_name);
    }

    fn clear(&mut self) {
        *self = Self {
            last_stamp: self.last_stamp,
            ..Self::default()
        };
    }
}

/// Disk-based cache that persists raw (possibly encrypted) image bytes.
pub struct DiskImageCache {
    cache_dir: PathBuf,
    max_size: u64,
    index: Mutex<Index>,
    /// Serialises mutations so space checks, writes and accounting never interleave.
    writes: tokio::sync::Mutex<()>,
}

impl DiskImageCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// Existing blobs are counted towards the budget and trimmed if they
    /// exceed it; abandoned partial writes are removed.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created or read.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::DirUnavailable(format!("{}: {e}", cache_dir.display())))?;
        let mut index = Index::default();

        let mut entries = fs::read_dir(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.extension().is_some_and(|ext| ext == PARTIAL_EXT) {
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to remove partial cache file"
                    );
                }
                continue;
            }
            if is_blob_name(name)
                && let Ok(meta) = entry.metadata().await
                && meta.is_file()
            {
                index.set_size(name, meta.len());
            }
        }

        let cache = Self {
            cache_dir,
            max_size,
            index: Mutex::new(index),
            writes: tokio::sync::Mutex::new(()),
        };

        cache.ensure_space(0).await;

        Ok(cache)
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path for a cached blob.
    fn cache_path(&self, file_name: &str) -> PathBuf {
        self.cache_dir.join(file_name)
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.lock().sizes.len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if a key is cached.
    pub async fn contains(&self, key: &RawKey) -> bool {
        let path = self.cache_path(&key.file_name());
        fs::metadata(&path).await.is_ok_and(|m| m.is_file())
    }

    /// Evicts least recently accessed blobs until `incoming` more bytes fit.
    ///
    /// Callers hold `writes`, so the total cannot move underneath the scan.
    /// The scan also resynchronises sizes with the directory, dropping blobs
    /// removed behind the cache's back.
    async fn ensure_space(&self, incoming: u64) {
        if self.index.lock().total + incoming <= self.max_size {
            return;
        }

        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, String, SystemTime, u64)> = Vec::new();

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            if !is_blob_name(&name) {
                continue;
            }

            if let Ok(meta) = entry.metadata().await
                && meta.is_file()
            {
                let accessed = self.index.lock().last_access(&name).unwrap_or_else(|| {
                    meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)
                });
                files.push((path, name, accessed, meta.len()));
            }
        }

        let on_disk: HashMap<String, u64> = files
            .iter()
            .map(|(_, name, _, len)| (name.clone(), *len))
            .collect();
        let current_size = {
            let mut index = self.index.lock();
            index.resync_sizes(&on_disk);
            index.total
        };
        let required = (current_size + incoming).saturating_sub(self.max_size);
        if required == 0 {
            return;
        }

        debug!(
            current_size = current_size,
            incoming = incoming,
            max_size = self.max_size,
            "Disk cache over limit, cleaning up"
        );

        files.sort_by_key(|(_, _, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;

        for (path, name, _, size) in files {
            if freed_size >= required {
                break;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    self.index.lock().forget_file(&name);
                    debug!(path = %path.display(), size, "Evicted old cache file");
                    freed_size += size;
                    freed_count += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.index.lock().forget_file(&name);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove old cache file");
                }
            }
        }

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "Disk cache cleanup complete"
        );
    }

    /// Removes whatever occupies a blob path and forgets the key.
    async fn purge(&self, key: &RawKey, file_name: &str) {
        let _writes = self.writes.lock().await;
        let path = self.cache_path(file_name);
        let removed = match fs::symlink_metadata(&path).await {
            Ok(m) if m.is_dir() => fs::remove_dir_all(&path).await,
            _ => fs::remove_file(&path).await,
        };

        match removed {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to purge disk cache entry");
                return;
            }
        }
        self.index.lock().forget_key(key, file_name);
    }

    /// Sets the blob's modification time to its access stamp.
    async fn refresh_mtime(path: PathBuf, stamp: SystemTime) {
        let result = tokio::task::spawn_blocking(move || {
            std::fs::File::options()
                .write(true)
                .open(&path)
                .and_then(|file| file.set_modified(stamp))
        })
        .await;

        if let Ok(Err(e)) = result {
            trace!(error = %e, "Could not refresh cache file mtime");
        }
    }

    async fn write_blob(&self, path: &Path, temp_path: &Path, bytes: &[u8]) -> CacheResult<()> {
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create cache file: {e}")))?;

        file.write_all(bytes)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to write cache file: {e}")))?;

        file.flush()
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to flush cache file: {e}")))?;
        drop(file);

        fs::rename(temp_path, path)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to move cache file into place: {e}")))
    }
}

#[async_trait::async_trait]
impl ByteCachePort for DiskImageCache {
    async fn get(&self, key: &RawKey) -> Option<Bytes> {
        let file_name = key.file_name();
        let path = self.cache_path(&file_name);

        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(key = %key, path = %path.display(), "Disk cache hit");
                let stamp = self.index.lock().touch(key, file_name);
                Self::refresh_mtime(path, stamp).await;
                Some(Bytes::from(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(key = %key, "Disk cache miss");
                self.index.lock().forget_recency(key, &file_name);
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Unreadable disk cache entry, discarding");
                self.purge(key, &file_name).await;
                None
            }
        }
    }

    async fn put(&self, key: &RawKey, bytes: &[u8]) -> CacheResult<()> {
        let file_name = key.file_name();
        let path = self.cache_path(&file_name);
        let new_size = bytes.len() as u64;

        let _writes = self.writes.lock().await;

        // A blob being replaced frees its own space.
        let replaced = self.index.lock().sizes.get(&file_name).copied().unwrap_or(0);
        self.ensure_space(new_size.saturating_sub(replaced)).await;

        let temp_path = self.cache_path(&format!(
            "{file_name}.{}.{PARTIAL_EXT}",
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = self.write_blob(&path, &temp_path, bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        {
            let mut index = self.index.lock();
            index.set_size(&file_name, new_size);
            index.touch(key, file_name);
        }

        debug!(
            key = %key,
            path = %path.display(),
            size = bytes.len(),
            "Stored bytes in disk cache"
        );

        Ok(())
    }

    async fn remove(&self, key: &RawKey) {
        let file_name = key.file_name();
        let path = self.cache_path(&file_name);
        let _writes = self.writes.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => debug!(key = %key, "Removed from disk cache"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to remove from disk cache");
                return;
            }
        }
        self.index.lock().forget_key(key, &file_name);
    }

    async fn clear(&self) -> CacheResult<()> {
        let _writes = self.writes.lock().await;
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read entry: {e}")))?
        {
            let path = entry.path();
            let is_cache_file = path.file_name().and_then(|n| n.to_str()).is_some_and(|name| {
                is_blob_name(name) || path.extension().is_some_and(|ext| ext == PARTIAL_EXT)
            });
            if is_cache_file && fs::remove_file(&path).await.is_err() {
                warn!(path = %path.display(), "Failed to remove cache file");
            }
        }
        self.index.lock().clear();
        debug!("Cleared disk cache");
        Ok(())
    }

    async fn size(&self) -> u64 {
        self.index.lock().total
    }

    fn max_size(&self) -> u64 {
        self.max_size
    }
}

impl std::fmt::Debug for DiskImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskImageCache")
            .field("cache_dir", &self.cache_dir)
            .field("max_size", &self.max_size)
            .field("size", &self.index.lock().total)
            .finish_non_exhaustive()
    }
}

/// Blob files are named by a 128-bit hex digest.
fn is_blob_name(name: &str) -> bool {
    name.len() == 32 && name.chars().all(|c| c.is_ascii_hexdigit())
}

/// Returns the default cache directory path.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "lumen", "lumen").map_or_else(
        || std::env::temp_dir().join("lumen").join("disk_cache"),
        |dirs| dirs.cache_dir().join("disk_cache"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    async fn create_test_cache(max_size: u64) -> (DiskImageCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskImageCache::new(temp_dir.path().to_path_buf(), max_size)
            .await
            .unwrap();
        (cache, temp_dir)
    }

    async fn tick() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_put_and_get_bytes() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        let key = RawKey::new("url:https://x/img.png");
        let data = b"test image data";

        assert_ok!(cache.put(&key, data).await);
        let retrieved = cache.get(&key).await;

        assert_eq!(retrieved.as_deref(), Some(&data[..]));
    }

    #[tokio::test]
    async fn test_blob_is_stored_under_hashed_name() {
        let (cache, temp) = create_test_cache(1024 * 1024).await;
        let key = RawKey::new("file:/some/dir/with spaces & symbols?.png");

        cache.put(&key, b"abc").await.unwrap();

        let path = temp.path().join(key.file_name());
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        assert!(cache.get(&RawKey::new("url:nonexistent")).await.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        let key = RawKey::new("res:1");

        cache.put(&key, b"test").await.unwrap();
        assert!(cache.contains(&key).await);

        cache.remove(&key).await;
        assert!(!cache.contains(&key).await);
        assert!(cache.index.lock().access_times.is_empty());
        assert!(cache.index.lock().file_to_key.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let (cache, temp) = create_test_cache(1024 * 1024).await;

        cache.put(&RawKey::new("res:1"), b"data1").await.unwrap();
        cache.put(&RawKey::new("res:2"), b"data2").await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear().await.unwrap();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.size().await, 0);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_counters_stay_in_sync() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;

        assert_eq!(cache.size().await, 0);
        assert!(cache.is_empty());

        cache.put(&RawKey::new("res:1"), b"hello").await.unwrap();
        cache.put(&RawKey::new("res:2"), b"world!").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.size().await, 11);

        cache.put(&RawKey::new("res:1"), b"hey").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.size().await, 9);

        cache.remove(&RawKey::new("res:2")).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size().await, 3);
    }

    #[tokio::test]
    async fn test_eviction_removes_least_recently_accessed() {
        let (cache, _temp) = create_test_cache(30).await;
        let (a, b, c, d) = (
            RawKey::new("res:a"),
            RawKey::new("res:b"),
            RawKey::new("res:c"),
            RawKey::new("res:d"),
        );

        cache.put(&a, &[1; 10]).await.unwrap();
        cache.put(&b, &[2; 10]).await.unwrap();
        cache.put(&c, &[3; 10]).await.unwrap();

        // Reading `a` makes `b` the oldest.
        assert!(cache.get(&a).await.is_some());
        cache.put(&d, &[4; 10]).await.unwrap();

        assert!(cache.contains(&a).await);
        assert!(!cache.contains(&b).await);
        assert!(cache.contains(&c).await);
        assert!(cache.contains(&d).await);
        assert_eq!(cache.size().await, 30);
        assert_eq!(cache.len(), 3);

        let index = cache.index.lock();
        assert!(!index.access_times.contains_key(&b));
        assert!(!index.file_to_key.contains_key(&b.file_name()));
    }

    #[tokio::test]
    async fn test_eviction_frees_only_what_is_needed() {
        let (cache, _temp) = create_test_cache(40).await;
        for i in 0..4 {
            cache.put(&RawKey::new(format!("res:{i}")), &[0; 10]).await.unwrap();
        }

        cache.put(&RawKey::new("res:big"), &[9; 25]).await.unwrap();

        // 40 + 25 - 40 = 25 bytes needed: the three oldest go.
        assert!(!cache.contains(&RawKey::new("res:0")).await);
        assert!(!cache.contains(&RawKey::new("res:1")).await);
        assert!(!cache.contains(&RawKey::new("res:2")).await);
        assert!(cache.contains(&RawKey::new("res:3")).await);
        assert_eq!(cache.size().await, 35);
    }

    #[tokio::test]
    async fn test_size_stays_within_budget_plus_newest_blob() {
        let (cache, temp) = create_test_cache(100).await;
        for i in 0..10 {
            cache.put(&RawKey::new(format!("res:{i}")), &[0; 10]).await.unwrap();
        }
        cache.put(&RawKey::new("res:new"), &[1; 17]).await.unwrap();

        let on_disk: u64 = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().metadata().unwrap().len())
            .sum();
        assert!(on_disk <= 100 + 17);
        assert_eq!(on_disk, cache.size().await);
    }

    #[tokio::test]
    async fn test_unindexed_files_fall_back_to_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        let (a, b) = (RawKey::new("res:a"), RawKey::new("res:b"));

        {
            let cache = DiskImageCache::new(dir.clone(), 20).await.unwrap();
            cache.put(&a, &[1; 10]).await.unwrap();
            tick().await;
            cache.put(&b, &[2; 10]).await.unwrap();
            tick().await;
            // Refreshes a's mtime past b's.
            assert!(cache.get(&a).await.is_some());
        }

        let reopened = DiskImageCache::new(dir, 20).await.unwrap();
        assert_eq!(reopened.size().await, 20);
        reopened.put(&RawKey::new("res:c"), &[3; 10]).await.unwrap();

        assert!(reopened.contains(&a).await);
        assert!(!reopened.contains(&b).await);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss_and_removed() {
        let (cache, temp) = create_test_cache(1024).await;
        let key = RawKey::new("url:https://x/broken.png");
        cache.put(&key, b"bytes").await.unwrap();

        // Replace the blob with something that cannot be read as a file.
        let path = temp.path().join(key.file_name());
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(cache.get(&key).await.is_none());
        assert!(!path.exists());
        assert!(!cache.index.lock().access_times.contains_key(&key));
        assert!(!cache.index.lock().file_to_key.contains_key(&key.file_name()));

        cache.put(&key, b"fresh").await.unwrap();
        assert_eq!(cache.get(&key).await.as_deref(), Some(&b"fresh"[..]));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let (cache, temp) = create_test_cache(1024).await;
        std::fs::remove_dir_all(temp.path()).unwrap();

        assert_err!(cache.put(&RawKey::new("res:1"), b"data").await);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_startup_trims_and_drops_partials() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        {
            let cache = DiskImageCache::new(dir.clone(), 1024).await.unwrap();
            for i in 0..5 {
                cache.put(&RawKey::new(format!("res:{i}")), &[0; 10]).await.unwrap();
                tick().await;
            }
        }
        std::fs::write(dir.join("0123.abc.part"), b"half").unwrap();
        std::fs::write(dir.join("notes.txt"), b"unrelated").unwrap();

        let cache = DiskImageCache::new(dir.clone(), 25).await.unwrap();

        assert_eq!(cache.size().await, 20);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&RawKey::new("res:4")).await);
        assert!(!dir.join("0123.abc.part").exists());
        assert!(dir.join("notes.txt").exists());
    }

    fn bytes_on_disk(dir: &Path) -> (u64, usize) {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().metadata().unwrap().len())
            .fold((0, 0), |(size, count), len| (size + len, count + 1))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_of_one_key_count_one_blob() {
        let temp_dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(
            DiskImageCache::new(temp_dir.path().to_path_buf(), 100)
                .await
                .unwrap(),
        );
        let key = RawKey::new("url:https://x/img.png");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move { cache.put(&key, &[0; 20]).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(bytes_on_disk(temp_dir.path()), (20, 1));
        assert_eq!(cache.size().await, 20);
        assert_eq!(cache.len(), 1);

        // Plenty of room left: nothing gets evicted.
        let (a, b) = (RawKey::new("res:a"), RawKey::new("res:b"));
        cache.put(&a, &[1; 10]).await.unwrap();
        cache.put(&b, &[2; 10]).await.unwrap();
        assert!(cache.contains(&key).await);
        assert!(cache.contains(&a).await);
        assert!(cache.contains(&b).await);
        assert_eq!(cache.size().await, 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mixed_puts_match_files_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(
            DiskImageCache::new(temp_dir.path().to_path_buf(), 100)
                .await
                .unwrap(),
        );

        for _ in 0..5 {
            let handles: Vec<_> = (0..64)
                .map(|i| {
                    let cache = cache.clone();
                    tokio::spawn(async move {
                        let key = RawKey::new(format!("res:{}", i % 8));
                        cache.put(&key, &[0; 20]).await.unwrap();
                        let _ = cache.get(&key).await;
                    })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap();
            }

            let (on_disk, files) = bytes_on_disk(temp_dir.path());
            assert_eq!(cache.size().await, on_disk);
            assert_eq!(cache.len(), files);
            assert!(on_disk <= 100 + 20);
        }

        let index = cache.index.lock();
        assert_eq!(index.access_times.len(), index.file_to_key.len());
        for (file_name, key) in &index.file_to_key {
            assert_eq!(&key.file_name(), file_name);
            assert!(index.access_times.contains_key(key));
        }
    }

    #[tokio::test]
    async fn test_externally_deleted_blob_is_dropped_from_totals() {
        let (cache, temp) = create_test_cache(30).await;
        let (a, b) = (RawKey::new("res:a"), RawKey::new("res:b"));
        cache.put(&a, &[1; 20]).await.unwrap();
        std::fs::remove_file(temp.path().join(a.file_name())).unwrap();

        cache.put(&b, &[2; 20]).await.unwrap();

        assert_eq!(cache.size().await, 20);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&b).await);
    }
}

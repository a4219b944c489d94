//! Process-wide entry point tying caches, fetchers and the pipeline together.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::entities::{ImageRequest, ImageState};
use crate::domain::errors::{CacheResult, LumenError};
use crate::domain::ports::{ByteCachePort, Decoder, Fetcher, ImageCachePort};
use crate::infrastructure::config::LumenConfig;
use crate::infrastructure::fetch::{FetcherSet, ResourceFetcher, ResourceTable};
use crate::infrastructure::image::{
    DiskImageCache, ImageLoad, ImagePipeline, MemoryImageCache, RasterDecoder,
};

static DEFAULT: OnceCell<Arc<Lumen>> = OnceCell::const_new();

/// Image loader facade: one pipeline over one memory cache and one disk cache.
///
/// Use [`Lumen::get_default`] for the shared process-wide instance, or
/// [`Lumen::create`] / [`Lumen::builder`] for independent ones.
#[derive(Debug)]
pub struct Lumen {
    pipeline: ImagePipeline,
    resources: Arc<ResourceTable>,
}

impl Lumen {
    /// Returns the process-wide instance, creating it on first call.
    ///
    /// Only the call that performs initialisation reads `config`; concurrent
    /// first callers all receive the same instance.
    ///
    /// # Errors
    /// Returns error if the disk cache or the HTTP client cannot be set up.
    /// A failed initialisation is retried by the next call.
    pub async fn get_default(config: &LumenConfig) -> Result<Arc<Self>, LumenError> {
        DEFAULT
            .get_or_try_init(|| async {
                info!("Initializing default image loader");
                Self::create(None, None, config).await.map(Arc::new)
            })
            .await
            .cloned()
    }

    /// Creates an independent instance. Caches not supplied are built from `config`.
    ///
    /// # Errors
    /// Returns error if the disk cache or the HTTP client cannot be set up.
    pub async fn create(
        memory_cache: Option<Arc<dyn ImageCachePort>>,
        disk_cache: Option<Arc<dyn ByteCachePort>>,
        config: &LumenConfig,
    ) -> Result<Self, LumenError> {
        let mut builder = Self::builder();
        if let Some(cache) = memory_cache {
            builder = builder.memory_cache(cache);
        }
        if let Some(cache) = disk_cache {
            builder = builder.disk_cache(cache);
        }
        builder.build(config).await
    }

    /// Starts building an instance with custom collaborators.
    #[must_use]
    pub fn builder() -> LumenBuilder {
        LumenBuilder::default()
    }

    /// Starts loading `request`. See [`ImagePipeline::load`].
    pub fn load(&self, request: ImageRequest) -> ImageLoad {
        self.pipeline.load(request)
    }

    /// Loads `request` and waits for its terminal state. None if cancelled.
    pub async fn get(&self, request: ImageRequest) -> Option<ImageState> {
        self.pipeline.get(request).await
    }

    /// Warms the caches for `request`.
    pub fn prefetch(&self, request: ImageRequest) {
        self.pipeline.prefetch(request);
    }

    /// Cancels every in-flight load.
    pub fn cancel_all(&self) {
        self.pipeline.cancel_all();
    }

    /// Returns the number of loads still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pipeline.in_flight()
    }

    /// Waits for pending disk writes.
    pub async fn flush(&self) {
        self.pipeline.flush().await;
    }

    /// Empties the memory cache.
    pub async fn clear_memory_cache(&self) {
        self.pipeline.memory_cache().clear().await;
        info!("Cleared memory image cache");
    }

    /// Empties the disk cache.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be read.
    pub async fn clear_disk_cache(&self) -> CacheResult<()> {
        self.pipeline.disk_cache().clear().await?;
        info!("Cleared disk image cache");
        Ok(())
    }

    /// Empties both caches, memory first.
    ///
    /// # Errors
    /// Returns error if the disk cache cannot be cleared.
    pub async fn clear_cache(&self) -> CacheResult<()> {
        self.clear_memory_cache().await;
        self.clear_disk_cache().await
    }

    /// Returns the memory cache.
    #[must_use]
    pub fn memory_cache(&self) -> &Arc<dyn ImageCachePort> {
        self.pipeline.memory_cache()
    }

    /// Returns the disk cache.
    #[must_use]
    pub fn disk_cache(&self) -> &Arc<dyn ByteCachePort> {
        self.pipeline.disk_cache()
    }

    /// Returns the table served for `Resource` sources by the default fetchers.
    #[must_use]
    pub const fn resources(&self) -> &Arc<ResourceTable> {
        &self.resources
    }
}

/// Builder for [`Lumen`].
#[derive(Default)]
pub struct LumenBuilder {
    memory_cache: Option<Arc<dyn ImageCachePort>>,
    disk_cache: Option<Arc<dyn ByteCachePort>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    decoder: Option<Arc<dyn Decoder>>,
}

impl LumenBuilder {
    /// Uses `cache` as the memory tier.
    #[must_use]
    pub fn memory_cache(mut self, cache: Arc<dyn ImageCachePort>) -> Self {
        self.memory_cache = Some(cache);
        self
    }

    /// Uses `cache` as the disk tier.
    #[must_use]
    pub fn disk_cache(mut self, cache: Arc<dyn ByteCachePort>) -> Self {
        self.disk_cache = Some(cache);
        self
    }

    /// Replaces the per-kind fetchers with `fetchers`.
    #[must_use]
    pub fn fetchers(self, fetchers: FetcherSet) -> Self {
        self.fetcher(Arc::new(fetchers))
    }

    /// Uses `fetcher` for every source kind.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replaces the raster decoder.
    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Builds the instance, filling unset parts from `config`.
    ///
    /// # Errors
    /// Returns error if the disk cache or the HTTP client cannot be set up.
    pub async fn build(self, config: &LumenConfig) -> Result<Lumen, LumenError> {
        let resources = Arc::new(ResourceTable::new());

        let memory_cache: Arc<dyn ImageCachePort> = match self.memory_cache {
            Some(cache) => cache,
            None => Arc::new(MemoryImageCache::new(config.effective_memory_cache_size())),
        };
        let disk_cache: Arc<dyn ByteCachePort> = match self.disk_cache {
            Some(cache) => cache,
            None => Arc::new(
                DiskImageCache::new(config.effective_disk_cache_dir(), config.cache.disk_size)
                    .await?,
            ),
        };
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                FetcherSet::new(config.http_timeout(), &config.http.user_agent)?
                    .with_resource(Arc::new(ResourceFetcher::new(resources.clone()))),
            ),
        };
        let decoder: Arc<dyn Decoder> = match self.decoder {
            Some(decoder) => decoder,
            None => Arc::new(RasterDecoder),
        };

        debug!(
            memory_max = memory_cache.max_size(),
            disk_max = disk_cache.max_size(),
            "Image loader ready"
        );

        Ok(Lumen {
            pipeline: ImagePipeline::new(memory_cache, disk_cache, fetcher, decoder),
            resources,
        })
    }
}

impl std::fmt::Debug for LumenBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LumenBuilder").finish_non_exhaustive()
    }
}

//! Staged image loading: memory -> disk -> fetch -> decrypt -> decode -> transform.
//!
//! Each load runs as its own tokio task with its own cancellation token, so
//! loads proceed concurrently and cancelling one leaves its siblings alone.
//! CPU-bound stages run on the blocking pool.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::FutureExt;
use futures_util::stream::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, debug_span, error, warn};
use uuid::Uuid;

use crate::domain::entities::{FullKey, ImageRequest, ImageState, LoadOrigin, LoadedImage, RawKey};
use crate::domain::errors::LoadError;
use crate::domain::ports::{ByteCachePort, Decoder, Fetcher, ImageCachePort};

/// Handle to one in-flight load.
///
/// Yields `Loading` (only on a memory miss) followed by exactly one terminal
/// state. After [`ImageLoad::cancel`] it yields nothing more. Dropping the
/// handle does not cancel the load; it still runs to completion and fills
/// the caches.
#[derive(Debug)]
pub struct ImageLoad {
    id: Uuid,
    rx: mpsc::UnboundedReceiver<ImageState>,
    token: CancellationToken,
}

impl ImageLoad {
    /// Identifier of this load, also recorded on its tracing span.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Cancels this load. No further states are yielded.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once the load has been cancelled, directly or through its pipeline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the next state. Returns None once the load is finished or cancelled.
    pub async fn next_state(&mut self) -> Option<ImageState> {
        if self.token.is_cancelled() {
            return None;
        }
        let state = tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            state = self.rx.recv() => state,
        };
        if self.token.is_cancelled() {
            None
        } else {
            state
        }
    }

    /// Drives the load to its terminal state, skipping progress states.
    /// Returns None if the load was cancelled.
    pub async fn finish(mut self) -> Option<ImageState> {
        while let Some(state) = self.next_state().await {
            if state.is_terminal() {
                return Some(state);
            }
        }
        None
    }
}

impl Stream for ImageLoad {
    type Item = ImageState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(_)) if self.token.is_cancelled() => Poll::Ready(None),
            other => other,
        }
    }
}

/// Decrements the in-flight count when a load task ends, however it ends.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self(count)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Orchestrates image loading over a memory cache and a disk cache.
pub struct ImagePipeline {
    memory_cache: Arc<dyn ImageCachePort>,
    disk_cache: Arc<dyn ByteCachePort>,
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<dyn Decoder>,
    scope: Mutex<CancellationToken>,
    in_flight: Arc<AtomicUsize>,
    disk_writes: TaskTracker,
    flushing: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .field("pending_disk_writes", &self.disk_writes.len())
            .finish_non_exhaustive()
    }
}

impl ImagePipeline {
    /// Creates a pipeline over the given caches and collaborators.
    #[must_use]
    pub fn new(
        memory_cache: Arc<dyn ImageCachePort>,
        disk_cache: Arc<dyn ByteCachePort>,
        fetcher: Arc<dyn Fetcher>,
        decoder: Arc<dyn Decoder>,
    ) -> Self {
        Self {
            memory_cache,
            disk_cache,
            fetcher,
            decoder,
            scope: Mutex::new(CancellationToken::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            disk_writes: TaskTracker::new(),
            flushing: tokio::sync::Mutex::new(()),
        }
    }

    /// Starts loading `request` on a new task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&self, request: ImageRequest) -> ImageLoad {
        let id = Uuid::new_v4();
        let token = self.scope.lock().child_token();
        let (tx, rx) = mpsc::unbounded_channel();

        let stages = Stages {
            memory_cache: self.memory_cache.clone(),
            disk_cache: self.disk_cache.clone(),
            fetcher: self.fetcher.clone(),
            decoder: self.decoder.clone(),
            token: token.clone(),
            tx,
            disk_writes: self.disk_writes.clone(),
        };
        let span = debug_span!(
            "image_load",
            id = %id,
            source = %request.source,
            priority = %request.priority
        );
        let guard = InFlightGuard::new(self.in_flight.clone());

        tokio::spawn(
            async move {
                let _guard = guard;
                let token = stages.token.clone();
                tokio::select! {
                    biased;
                    () = token.cancelled() => debug!("Image load cancelled"),
                    outcome = AssertUnwindSafe(stages.run(request)).catch_unwind() => {
                        if let Err(panic_info) = outcome {
                            let panic_msg = panic_message(panic_info.as_ref());
                            error!(panic = %panic_msg, "Image load task panicked");
                            stages.emit(ImageState::Error(LoadError::Worker(panic_msg)));
                        }
                    }
                }
            }
            .instrument(span),
        );

        ImageLoad { id, rx, token }
    }

    /// Loads `request` and waits for its terminal state.
    /// Returns None if the load was cancelled.
    pub async fn get(&self, request: ImageRequest) -> Option<ImageState> {
        self.load(request).finish().await
    }

    /// Loads `request` into the caches without observing the result.
    pub fn prefetch(&self, request: ImageRequest) {
        drop(self.load(request));
    }

    /// Cancels every in-flight load. Loads started afterwards run normally.
    pub fn cancel_all(&self) {
        let previous = std::mem::replace(&mut *self.scope.lock(), CancellationToken::new());
        previous.cancel();
        debug!(
            in_flight = self.in_flight.load(Ordering::Relaxed),
            "Cancelled all image loads"
        );
    }

    /// Waits for disk writes scheduled by earlier loads to finish.
    pub async fn flush(&self) {
        let _flushing = self.flushing.lock().await;
        self.disk_writes.close();
        self.disk_writes.wait().await;
        self.disk_writes.reopen();
    }

    /// Returns the number of loads still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns the memory cache.
    #[must_use]
    pub fn memory_cache(&self) -> &Arc<dyn ImageCachePort> {
        &self.memory_cache
    }

    /// Returns the disk cache.
    #[must_use]
    pub fn disk_cache(&self) -> &Arc<dyn ByteCachePort> {
        &self.disk_cache
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Runs `f` on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, LoadError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LoadError::Worker(e.to_string()))
}

/// Everything one load task needs.
struct Stages {
    memory_cache: Arc<dyn ImageCachePort>,
    disk_cache: Arc<dyn ByteCachePort>,
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<dyn Decoder>,
    token: CancellationToken,
    tx: mpsc::UnboundedSender<ImageState>,
    disk_writes: TaskTracker,
}

impl Stages {
    /// Sends a state unless the load was cancelled. A dropped receiver is not
    /// an error: the load still completes and fills the caches.
    fn emit(&self, state: ImageState) {
        if !self.token.is_cancelled() {
            let _ = self.tx.send(state);
        }
    }

    async fn run(&self, request: ImageRequest) {
        let full_key = request.full_key();

        if let Some(image) = self.memory_cache.get(&full_key).await {
            debug!(key = %full_key, "Served from memory cache");
            self.emit(ImageState::Success(LoadedImage {
                key: full_key,
                image,
                origin: LoadOrigin::Memory,
            }));
            return;
        }

        self.emit(ImageState::Loading);

        let state = match self.execute(&request, full_key).await {
            Ok(loaded) => {
                debug!(key = %loaded.key, origin = %loaded.origin, "Image loaded successfully");
                ImageState::Success(loaded)
            }
            Err(err) => {
                warn!(category = err.category(), error = %err, "Image load failed");
                ImageState::from(err)
            }
        };
        self.emit(state);
    }

    async fn execute(
        &self,
        request: &ImageRequest,
        full_key: FullKey,
    ) -> Result<LoadedImage, LoadError> {
        let raw_key = request.raw_key();
        let (raw, origin) = self.raw_bytes(request, &raw_key).await?;

        // Decrypt only after the disk round trip; plaintext never reaches the disk cache.
        let plain = match &request.decryptor {
            Some(decryptor) => {
                let decryptor = decryptor.clone();
                Bytes::from(blocking(move || decryptor.decrypt(&raw)).await??)
            }
            None => raw,
        };

        let decoder = self.decoder.clone();
        let mut image = blocking(move || decoder.decode(&plain)).await??;

        for transformer in &request.transformers {
            let transformer = transformer.clone();
            let input = image;
            image = blocking(move || {
                transformer
                    .transform(&input)
                    .map_err(|e| LoadError::transform(transformer.key(), e))
            })
            .await??;
        }

        let image = Arc::new(image);
        if !self.token.is_cancelled() {
            self.memory_cache.put(full_key.clone(), image.clone()).await;
        }

        Ok(LoadedImage {
            key: full_key,
            image,
            origin,
        })
    }

    /// Disk cache first; on a miss, fetch and schedule a disk write off the critical path.
    async fn raw_bytes(
        &self,
        request: &ImageRequest,
        raw_key: &RawKey,
    ) -> Result<(Bytes, LoadOrigin), LoadError> {
        if let Some(bytes) = self.disk_cache.get(raw_key).await {
            debug!(key = %raw_key, size = bytes.len(), "Served raw bytes from disk cache");
            return Ok((bytes, LoadOrigin::Disk));
        }

        let bytes = self.fetcher.fetch(&request.source).await?;
        debug!(key = %raw_key, size = bytes.len(), "Fetched raw bytes");

        if !self.token.is_cancelled() {
            let disk_cache = self.disk_cache.clone();
            let key = raw_key.clone();
            let blob = bytes.clone();
            self.disk_writes.spawn(
                async move {
                    if let Err(e) = disk_cache.put(&key, &blob).await {
                        warn!(key = %key, error = %e, "Failed to cache to disk");
                    }
                }
                .in_current_span(),
            );
        }

        Ok((bytes, LoadOrigin::Fetched))
    }
}

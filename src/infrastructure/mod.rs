//! Infrastructure layer with caches, fetchers and the load pipeline.

/// Configuration and CLI arguments.
pub mod config;
/// Source fetchers.
pub mod fetch;
/// Image handling (caching, decoding, transforms, loading).
pub mod image;
/// Host resource detection.
pub mod system;

pub use config::{CliArgs, LogLevel, LumenConfig, StorageManager};
pub use fetch::{FetcherSet, ResourceTable};
pub use image::{
    CacheStats, DiskImageCache, ImageLoad, ImagePipeline, MemoryImageCache, RasterDecoder,
    ResizeTransformer, RoundedCornersTransformer,
};

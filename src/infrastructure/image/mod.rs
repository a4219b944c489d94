//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching of decoded images with LRU eviction
//! - Disk caching of raw bytes for persistence
//! - Decoding and transformation
//! - The staged async loading pipeline

pub mod decoder;
pub mod disk_cache;
pub mod memory_cache;
pub mod pipeline;
pub mod transform;

pub use decoder::RasterDecoder;
pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskImageCache, default_cache_dir};
pub use memory_cache::{CacheStats, MemoryImageCache, default_max_size, image_size};
pub use pipeline::{ImageLoad, ImagePipeline};
pub use transform::{ResizeTransformer, RoundedCornersTransformer};

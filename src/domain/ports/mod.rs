mod fetcher_port;
mod image_cache_port;
mod processing_port;

pub use fetcher_port::Fetcher;
#[cfg(test)]
pub use fetcher_port::MockFetcher;
pub use image_cache_port::{ByteCachePort, ImageCachePort};
pub use processing_port::{Decoder, Decryptor, Transformer};

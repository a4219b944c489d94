//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{FullKey, ImageRequest, ImageSource, ImageState, LoadedImage, Priority, RawKey};
pub use errors::{CacheError, LoadError, LumenError};
pub use ports::{ByteCachePort, Decoder, Decryptor, Fetcher, ImageCachePort, Transformer};

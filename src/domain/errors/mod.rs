//! Domain error types.

mod cache_error;
mod load_error;
mod lumen_error;

pub use cache_error::{CacheError, CacheResult};
pub use load_error::{DecodeError, DecryptError, FetchError, LoadError, TransformError};
pub use lumen_error::LumenError;

//! Domain entity definitions.

mod cache_key;
mod image_request;
mod image_state;

pub use cache_key::{FullKey, RawKey};
pub use image_request::{ImageRequest, ImageSource, ParseSourceError, Priority, Visual};
pub use image_state::{ImageState, LoadOrigin, LoadedImage};

//! Built-in transformers.

mod resize;
mod rounded_corners;

pub use resize::ResizeTransformer;
pub use rounded_corners::RoundedCornersTransformer;

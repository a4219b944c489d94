//! Application layer exposing the image loader facade.

/// Loader facade and its builder.
pub mod lumen;

pub use lumen::{Lumen, LumenBuilder};

//! Lumen - an asynchronous image loading pipeline.
//!
//! Images are loaded from remote URLs, local files, content handles or
//! registered resources, optionally decrypted, decoded and transformed.
//! Decoded results live in an in-memory LRU cache keyed by the full request;
//! raw source bytes live in a disk cache keyed by the source alone.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the loader facade.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing caches, fetchers and the pipeline.
pub mod infrastructure;

pub use application::Lumen;
pub use domain::{ImageRequest, ImageSource, ImageState};

/// Current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = "lumen";

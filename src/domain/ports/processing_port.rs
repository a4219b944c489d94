//! Ports for the CPU-bound processing stages.
//!
//! All three run on the blocking worker pool and must not depend on hidden
//! external state: equal inputs produce equal outputs.

use crate::domain::errors::{DecodeError, DecryptError, TransformError};

/// Turns raw (possibly encrypted) bytes into plaintext bytes.
pub trait Decryptor: Send + Sync {
    /// Stable identifier, part of the memory cache key.
    fn key(&self) -> String;

    /// Decrypts `bytes`.
    ///
    /// # Errors
    /// Returns `DecryptError` for rejected ciphertext or missing key material.
    fn decrypt(&self, bytes: &[u8]) -> Result<Vec<u8>, DecryptError>;
}

/// Turns plaintext bytes into an image.
pub trait Decoder: Send + Sync {
    /// Decodes `bytes`.
    ///
    /// # Errors
    /// Returns `DecodeError` for malformed or unsupported data.
    fn decode(&self, bytes: &[u8]) -> Result<image::DynamicImage, DecodeError>;
}

/// Produces a new image from an input image.
pub trait Transformer: Send + Sync {
    /// Stable identifier, part of the memory cache key.
    fn key(&self) -> String;

    /// Transforms `image` without mutating it.
    ///
    /// # Errors
    /// Returns `TransformError` when a precondition does not hold.
    fn transform(&self, image: &image::DynamicImage)
    -> Result<image::DynamicImage, TransformError>;
}

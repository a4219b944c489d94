//! Errors that abort an image load.

use thiserror::Error;

/// Failure to retrieve raw bytes from a source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("source not found: {source_key}")]
    NotFound { source_key: String },

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("I/O error reading source: {message}")]
    Io { message: String },

    #[error("no fetcher for source kind `{kind}`")]
    UnsupportedSource { kind: String },

    /// The collaborator has nothing to give; callers show their own fallback.
    #[error("source declined: {reason}")]
    Declined { reason: String },
}

impl FetchError {
    /// Creates not found error.
    #[must_use]
    pub fn not_found(source_key: impl Into<String>) -> Self {
        Self::NotFound {
            source_key: source_key.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates declined error.
    #[must_use]
    pub fn declined(reason: impl Into<String>) -> Self {
        Self::Declined {
            reason: reason.into(),
        }
    }
}

/// Failure to decrypt raw bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum DecryptError {
    #[error("ciphertext rejected: {message}")]
    InvalidCiphertext { message: String },

    /// No key material is available; callers show their own fallback.
    #[error("decryption key unavailable: {message}")]
    KeyUnavailable { message: String },
}

impl DecryptError {
    /// Creates invalid ciphertext error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidCiphertext {
            message: message.into(),
        }
    }

    /// Creates key unavailable error.
    #[must_use]
    pub fn key_unavailable(message: impl Into<String>) -> Self {
        Self::KeyUnavailable {
            message: message.into(),
        }
    }
}

/// Failure to turn bytes into an image.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum DecodeError {
    #[error("malformed image data: {message}")]
    Malformed { message: String },

    #[error("unsupported image format: {message}")]
    Unsupported { message: String },
}

impl DecodeError {
    /// Creates malformed data error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates unsupported format error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }
}

/// Failure inside a transformer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TransformError {
    #[error("invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("transform failed: {message}")]
    Failed { message: String },
}

impl TransformError {
    /// Creates invalid geometry error.
    #[must_use]
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    /// Creates generic failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Reason a load ended without an image.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// Fetch stage failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// Decrypt stage failed.
    #[error("decrypt failed: {0}")]
    Decrypt(#[from] DecryptError),
    /// Decode stage failed.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    /// A transformer failed.
    #[error("transform `{key}` failed: {source}")]
    Transform {
        /// Key of the failing transformer.
        key: String,
        /// Underlying error.
        source: TransformError,
    },
    /// A worker task died before producing a result.
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl LoadError {
    /// Wraps a transformer failure with the transformer's key.
    #[must_use]
    pub fn transform(key: impl Into<String>, source: TransformError) -> Self {
        Self::Transform {
            key: key.into(),
            source,
        }
    }

    /// Short category name, suitable for picking a fallback visual.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Decrypt(_) => "decrypt",
            Self::Decode(_) => "decode",
            Self::Transform { .. } => "transform",
            Self::Worker(_) => "worker",
        }
    }

    /// Returns true for soft failures that map to a fallback state.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::Fetch(FetchError::Declined { .. })
                | Self::Decrypt(DecryptError::KeyUnavailable { .. })
        )
    }
}

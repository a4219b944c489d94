//! Cache keys derived from image requests.

use sha2::{Digest, Sha256};

/// Identifies the raw bytes of a source.
///
/// Requests that differ only in decryption or transformation share a raw key,
/// and therefore share one disk cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawKey(String);

impl RawKey {
    /// Wraps an already formatted key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Name of the file holding this key's bytes in the disk cache.
    ///
    /// The first 128 bits of the SHA-256 digest, hex encoded.
    #[must_use]
    pub fn file_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }
}

impl std::fmt::Display for RawKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RawKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifies a fully decrypted and transformed image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullKey(String);

impl FullKey {
    /// Wraps an already formatted key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FullKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FullKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_128_bit_hex() {
        let name = RawKey::new("url:https://x/img.png").file_name();
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_file_name_consistency() {
        let a = RawKey::new("url:https://x/img.png?size=1&q=a b");
        let b = RawKey::new("url:https://x/img.png?size=1&q=a b");
        assert_eq!(a.file_name(), b.file_name());
        assert_ne!(a.file_name(), RawKey::new("url:https://x/other.png").file_name());
    }
}

//! Image load requests and their data sources.

use std::any::Any;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::ports::{Decryptor, Transformer};

use super::cache_key::{FullKey, RawKey};

/// Where the raw bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// Remote resource addressed by URL.
    RemoteUrl(String),
    /// File on the local filesystem.
    LocalFile(PathBuf),
    /// Opaque content handle resolved by a `ContentResolver`.
    ContentHandle(String),
    /// Embedded resource addressed by numeric id.
    Resource(i32),
}

impl ImageSource {
    /// Creates a remote URL source.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::RemoteUrl(url.into())
    }

    /// Creates a local file source.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::LocalFile(path.into())
    }

    /// Creates a content handle source.
    #[must_use]
    pub fn content(handle: impl Into<String>) -> Self {
        Self::ContentHandle(handle.into())
    }

    /// Short tag naming the source kind, used as the raw key prefix.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RemoteUrl(_) => "url",
            Self::LocalFile(_) => "file",
            Self::ContentHandle(_) => "uri",
            Self::Resource(_) => "res",
        }
    }

    /// Key identifying the source independent of any decryption or transformation.
    ///
    /// Local paths are made absolute without touching the filesystem, so
    /// `a.png` and `./a.png` share one entry.
    #[must_use]
    pub fn raw_key(&self) -> RawKey {
        let identity = match self {
            Self::RemoteUrl(url) => url.clone(),
            Self::LocalFile(path) => absolute_path(path).display().to_string(),
            Self::ContentHandle(handle) => handle.clone(),
            Self::Resource(id) => id.to_string(),
        };
        RawKey::new(format!("{}:{identity}", self.kind()))
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteUrl(url) => write!(f, "{url}"),
            Self::LocalFile(path) => write!(f, "{}", path.display()),
            Self::ContentHandle(handle) => write!(f, "{handle}"),
            Self::Resource(id) => write!(f, "res:{id}"),
        }
    }
}

/// Error returned when a source string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid image source `{input}`: {reason}")]
pub struct ParseSourceError {
    input: String,
    reason: &'static str,
}

impl FromStr for ImageSource {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseSourceError {
                input: s.to_string(),
                reason: "empty source",
            });
        }

        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::RemoteUrl(s.to_string()));
        }

        if let Some(id) = s.strip_prefix("res:") {
            return id.parse().map(Self::Resource).map_err(|_| ParseSourceError {
                input: s.to_string(),
                reason: "resource id must be an integer",
            });
        }

        if s.contains("://") {
            return Ok(Self::ContentHandle(s.to_string()));
        }

        Ok(Self::LocalFile(PathBuf::from(s)))
    }
}

/// Advisory load priority.
///
/// Carried through to logging; loads are not scheduled by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Background work.
    Low,
    /// Regular loads.
    #[default]
    Normal,
    /// Loads for content about to become visible.
    High,
    /// Loads for content visible right now.
    Immediate,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Immediate => write!(f, "immediate"),
        }
    }
}

/// Caller-supplied visual (placeholder or error art).
///
/// Never inspected by the loader; it is handed back untouched.
#[derive(Clone)]
pub struct Visual(Arc<dyn Any + Send + Sync>);

impl Visual {
    /// Wraps any value as an opaque visual.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the wrapped value if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl std::fmt::Debug for Visual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Visual(..)")
    }
}

/// Immutable description of one image load.
#[derive(Clone)]
pub struct ImageRequest {
    /// Data source.
    pub source: ImageSource,
    /// Visual to show while loading.
    pub placeholder: Option<Visual>,
    /// Visual to show when loading fails.
    pub error: Option<Visual>,
    /// Optional decryption applied to the raw bytes.
    pub decryptor: Option<Arc<dyn Decryptor>>,
    /// Transformations applied to the decoded image, in order.
    pub transformers: Vec<Arc<dyn Transformer>>,
    /// Advisory priority.
    pub priority: Priority,
}

impl ImageRequest {
    /// Creates a request for the given source with no processing steps.
    #[must_use]
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            placeholder: None,
            error: None,
            decryptor: None,
            transformers: Vec::new(),
            priority: Priority::Normal,
        }
    }

    /// Sets the placeholder visual.
    #[must_use]
    pub fn with_placeholder(mut self, visual: Visual) -> Self {
        self.placeholder = Some(visual);
        self
    }

    /// Sets the error visual.
    #[must_use]
    pub fn with_error(mut self, visual: Visual) -> Self {
        self.error = Some(visual);
        self
    }

    /// Sets the decryptor.
    #[must_use]
    pub fn with_decryptor(mut self, decryptor: Arc<dyn Decryptor>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    /// Appends a transformer to the end of the chain.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Key of the raw source bytes; selects the disk cache entry.
    #[must_use]
    pub fn raw_key(&self) -> RawKey {
        self.source.raw_key()
    }

    /// Key of the fully processed image; selects the memory cache entry.
    #[must_use]
    pub fn full_key(&self) -> FullKey {
        let mut key = self.raw_key().into_string();
        if let Some(decryptor) = &self.decryptor {
            let _ = write!(key, "_decrypt:{}", decryptor.key());
        }
        for (index, transformer) in self.transformers.iter().enumerate() {
            let _ = write!(key, "_transform{index}:{}", transformer.key());
        }
        FullKey::new(key)
    }
}

impl std::fmt::Debug for ImageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRequest")
            .field("source", &self.source)
            .field("decryptor", &self.decryptor.as_ref().map(|d| d.key()))
            .field(
                "transformers",
                &self.transformers.iter().map(|t| t.key()).collect::<Vec<_>>(),
            )
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl From<ImageSource> for ImageRequest {
    fn from(source: ImageSource) -> Self {
        Self::new(source)
    }
}

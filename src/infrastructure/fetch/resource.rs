//! Embedded resource fetcher.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::domain::entities::ImageSource;
use crate::domain::errors::FetchError;
use crate::domain::ports::Fetcher;

/// Table of embedded resources, addressed by id.
#[derive(Debug, Default)]
pub struct ResourceTable {
    entries: RwLock<HashMap<i32, Bytes>>,
}

impl ResourceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the bytes for `id`.
    pub fn register(&self, id: i32, bytes: impl Into<Bytes>) {
        self.entries.write().insert(id, bytes.into());
    }

    /// Removes the entry for `id`.
    pub fn unregister(&self, id: i32) -> Option<Bytes> {
        self.entries.write().remove(&id)
    }

    /// Returns the bytes for `id`.
    #[must_use]
    pub fn get(&self, id: i32) -> Option<Bytes> {
        self.entries.read().get(&id).cloned()
    }
}

/// Fetches `Resource` sources from a [`ResourceTable`].
#[derive(Debug, Clone, Default)]
pub struct ResourceFetcher {
    table: Arc<ResourceTable>,
}

impl ResourceFetcher {
    /// Creates a fetcher over `table`.
    #[must_use]
    pub const fn new(table: Arc<ResourceTable>) -> Self {
        Self { table }
    }

    /// Returns the backing table.
    #[must_use]
    pub fn table(&self) -> &Arc<ResourceTable> {
        &self.table
    }
}

#[async_trait]
impl Fetcher for ResourceFetcher {
    async fn fetch(&self, source: &ImageSource) -> Result<Bytes, FetchError> {
        match source {
            ImageSource::Resource(id) => self
                .table
                .get(*id)
                .ok_or_else(|| FetchError::declined(format!("resource {id} is not registered"))),
            other => Err(FetchError::UnsupportedSource {
                kind: other.kind().to_string(),
            }),
        }
    }
}

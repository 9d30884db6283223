//! Process-local bucket.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use r2drop_core::ObjectEntry;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::gateway::StorageGateway;

/// A bucket held in a [`DashMap`], keyed by object key.
#[derive(Debug, Default)]
pub struct InMemoryStorageGateway {
    objects: DashMap<String, ObjectEntry>,
}

impl InMemoryStorageGateway {
    /// Create an empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an object of `size` bytes, replacing any previous one.
    pub fn put_object(&self, key: impl Into<String>, size: u64) {
        let key = key.into();
        debug!(key = %key, size, "Storing object");
        self.objects.insert(
            key.clone(),
            ObjectEntry {
                key,
                size,
                uploaded: Utc::now(),
            },
        );
    }

    /// Whether `key` exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl StorageGateway for InMemoryStorageGateway {
    async fn list_objects(&self) -> StorageResult<Vec<ObjectEntry>> {
        let mut entries: Vec<ObjectEntry> = self
            .objects
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        let removed = self.objects.remove(key).is_some();
        debug!(key = %key, removed, "Deleted object");
        Ok(())
    }
}

//! The storage gateway seam.

use std::fmt::Debug;

use async_trait::async_trait;
use r2drop_core::ObjectEntry;

use crate::error::StorageResult;

/// List and delete access to one bucket.
///
/// Implementations are shared behind `Arc<dyn StorageGateway>` by the HTTP
/// service, so they must be safe to call concurrently.
#[async_trait]
pub trait StorageGateway: Send + Sync + Debug {
    /// Every object in the bucket, sorted by key.
    async fn list_objects(&self) -> StorageResult<Vec<ObjectEntry>>;

    /// Delete one object. Deleting an absent key succeeds.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;
}

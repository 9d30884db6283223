//! Storage gateway errors.

/// Errors returned by a [`StorageGateway`](crate::StorageGateway).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object key is empty.
    #[error("object key must not be empty")]
    EmptyKey,

    /// The backend rejected or failed the call.
    #[error("storage backend error during {operation}: {message}")]
    Backend {
        /// The backend operation, e.g. `ListObjectsV2`.
        operation: &'static str,
        /// Backend-provided detail.
        message: String,
    },
}

/// Convenience alias.
pub type StorageResult<T> = Result<T, StorageError>;

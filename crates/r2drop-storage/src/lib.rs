//! Storage gateway for r2drop.
//!
//! The gateway forwards list and delete calls to the bucket's native API using
//! the server's own credentials. No presigning happens here.
//!
//! Two backends are provided:
//!
//! - [`S3StorageGateway`] - any S3-compatible endpoint (R2 by default)
//! - [`InMemoryStorageGateway`] - a process-local bucket for tests

mod error;
mod gateway;
mod memory;
mod s3;

pub use error::{StorageError, StorageResult};
pub use gateway::StorageGateway;
pub use memory::InMemoryStorageGateway;
pub use s3::S3StorageGateway;

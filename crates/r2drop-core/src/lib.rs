//! Configuration, credentials, and shared types for r2drop.
//!
//! Configuration is read from the environment exactly once at process start and
//! handed to the signing engine and storage gateway as immutable values.

mod config;
mod error;
mod types;

pub use config::{
    DEFAULT_PRESIGN_EXPIRY_SECS, MAX_PRESIGN_EXPIRY_SECS, R2Config, ServerConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use types::{Credential, CredentialField, ObjectEntry};

//! AWS Signature Version 4 presigned URL engine for r2drop.
//!
//! This crate implements the signing side of SigV4 query-string authentication
//! from HMAC-SHA256 and SHA-256 primitives. Given backend credentials and an
//! object key it produces a time-limited URL that authorizes exactly one PUT
//! directly against the bucket.
//!
//! # Usage
//!
//! ```rust
//! use r2drop_auth::{SigningEngine, SigningRequest};
//! use r2drop_core::{Credential, R2Config};
//!
//! let config = R2Config::new(Credential::new(
//!     "exampleaccount",
//!     "AKIDEXAMPLE",
//!     "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
//!     "examplebucket",
//! ));
//! let engine = SigningEngine::new(&config);
//! let url = engine.presign(&SigningRequest::put("test.txt")).unwrap();
//! assert!(url.as_str().contains("X-Amz-Signature="));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction and the shared percent-encoding
//! - [`sigv4`] - Signing key derivation, string to sign, and signature computation
//! - [`presigned`] - Presigned URL assembly and verification
//! - [`engine`] - The [`SigningEngine`] facade
//! - [`error`] - Signing error types

pub mod canonical;
pub mod engine;
pub mod error;
pub mod presigned;
pub mod sigv4;

pub use engine::{SigningEngine, SigningRequest};
pub use error::SigningError;
pub use presigned::{PresignedUrl, verify_presigned};
pub use sigv4::{SigningKey, SigningTimestamp, derive_signing_key};

//! Error types for presigned URL signing and verification.
//!
//! Signing failures fall into three groups, each mapped to a different
//! response class by callers: [`SigningError::Configuration`] (server-side,
//! 5xx), [`SigningError::Validation`] (caller-fixable, 4xx), and
//! [`SigningError::Computation`] (internal fault). The remaining variants are
//! produced only when verifying a presigned request.

use r2drop_core::CredentialField;

/// Errors that can occur while signing or verifying a presigned URL.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// A required credential field is absent or blank.
    #[error("missing credential: {0} is not configured")]
    Configuration(CredentialField),

    /// A request parameter failed validation.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The offending parameter.
        field: &'static str,
        /// What was expected.
        reason: String,
    },

    /// A hashing or HMAC primitive failed.
    #[error("signature computation failed: {0}")]
    Computation(String),

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required query parameter for presigned URL authentication is missing.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),

    /// The `X-Amz-Credential` value does not match
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// A header listed in `X-Amz-SignedHeaders` is absent from the request.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The presigned URL was issued for a different access key.
    #[error("Access key not recognized: {0}")]
    AccessKeyMismatch(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The presigned URL has expired (current time exceeds `X-Amz-Date` + `X-Amz-Expires`).
    #[error("Request has expired")]
    RequestExpired,
}

impl SigningError {
    /// Shorthand for a [`SigningError::Validation`].
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the caller can fix this error by changing the request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Configuration(_) | Self::Computation(_))
    }
}

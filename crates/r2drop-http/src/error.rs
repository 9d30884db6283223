//! API errors and their HTTP status mapping.

use http::StatusCode;
use r2drop_auth::SigningError;
use r2drop_storage::StorageError;

/// An error rendered to the client as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status of the error response.
    pub status: StatusCode,
    /// Human-readable message placed in the `error` field.
    pub message: String,
}

impl ApiError {
    /// Create an error with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// `400 Bad Request`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// `404 Not Found` for an unknown path.
    #[must_use]
    pub fn not_found(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("No route for {path}"))
    }

    /// `405 Method Not Allowed`.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, path: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method {method} not allowed for {path}"),
        )
    }

    /// `500 Internal Server Error`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<SigningError> for ApiError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::Configuration(_) | SigningError::Computation(_) => {
                Self::internal(err.to_string())
            }
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::EmptyKey => Self::bad_request(err.to_string()),
            StorageError::Backend { .. } => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

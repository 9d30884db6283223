//! Client errors.

/// Errors returned by [`DropClient`](crate::DropClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The peer answered with a failure status. `body` is kept verbatim.
    #[error("request failed with status {status}: {body}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Response body as received.
        body: String,
    },

    /// The peer answered successfully but not with what was expected.
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl ClientError {
    /// The HTTP status for a [`ClientError::Transport`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias.
pub type ClientResult<T> = Result<T, ClientError>;

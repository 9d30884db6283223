//! Response body for the r2drop endpoints.
//!
//! Nothing r2drop returns is streamed. `generateUploadUrl`, `listFiles`, and
//! every error carry a small JSON document, `deleteFile` answers with the
//! plain-text `OK`, and CORS preflights are `204` with no body. A buffered
//! [`Full`] covers the first two and [`DropResponseBody::Empty`] the last.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Body of every response the gateway writes.
#[derive(Debug, Default)]
pub enum DropResponseBody {
    /// JSON or plain text, already serialized.
    Buffered(Full<Bytes>),
    /// No body: the `204` preflight answer.
    #[default]
    Empty,
}

impl DropResponseBody {
    /// Wrap a serialized JSON document or text payload.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create an empty response body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for DropResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}

//! HTTP service layer for r2drop.
//!
//! This crate exposes the signing engine and storage gateway over plain HTTP:
//!
//! - **Router**: Maps method and path to a [`Route`](router::Route)
//! - **Dispatch**: One handler per route, returning JSON responses
//! - **Service**: Hyper `Service` implementation adding request IDs and CORS headers
//! - **Response helpers**: JSON success/error response formatting
//! - **Server**: Accept loop with graceful shutdown

pub mod body;
pub mod dispatch;
pub mod error;
pub mod response;
pub mod router;
pub mod server;
pub mod service;

pub use body::DropResponseBody;
pub use error::ApiError;
pub use server::serve;
pub use service::{DropHttpService, DropState};

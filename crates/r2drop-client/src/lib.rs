//! Client library for r2drop.
//!
//! [`DropClient`] talks to an r2drop server for presigned URLs, listings, and
//! deletions, and performs the upload itself directly against the bucket.
//! Upload progress is reported as a finite sequence of [`ProgressTick`]s.

mod client;
mod error;
mod format;
mod progress;

pub use client::{DropClient, UploadOutcome};
pub use error::{ClientError, ClientResult};
pub use format::{format_bytes, render_table};
pub use progress::{DEFAULT_CHUNK_SIZE, ProgressPlan, ProgressTick, ProgressTicks};

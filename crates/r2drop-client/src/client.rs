//! HTTP client for the r2drop server and the presigned upload itself.

use bytes::Bytes;
use r2drop_core::ObjectEntry;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::progress::{ProgressPlan, ProgressTick};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlBody {
    upload_url: String,
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Object key the file was stored under.
    pub key: String,
    /// The object's address (the presigned URL without its query).
    pub object_url: String,
    /// Bytes sent.
    pub size: u64,
    /// Status returned by the bucket.
    pub status: u16,
}

/// Client for one r2drop server.
#[derive(Debug, Clone)]
pub struct DropClient {
    http: reqwest::Client,
    base_url: String,
}

impl DropClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest` client.
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url }
    }

    /// The server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the server for a presigned PUT URL for `name`.
    pub async fn request_upload_url(&self, name: &str) -> ClientResult<String> {
        let url = self.endpoint("/generateUploadUrl", &[("name", name)]);
        let resp = self.http.get(url).send().await?;
        let resp = ensure_success(resp, &[200]).await?;
        let body: UploadUrlBody = resp
            .json()
            .await
            .map_err(|e| ClientError::Protocol(format!("invalid upload URL response: {e}")))?;
        debug!(name = %name, "Received upload URL");
        Ok(body.upload_url)
    }

    /// PUT `data` to a presigned URL, streaming it in the plan's chunks.
    ///
    /// One [`ProgressTick`] is sent to `progress` as each chunk is pulled by
    /// the transport. Success is `200` or `201`; any other status becomes
    /// [`ClientError::Transport`] with the bucket's response body verbatim.
    pub async fn put_object(
        &self,
        url: &str,
        content_type: &str,
        data: Bytes,
        plan: ProgressPlan,
        progress: Option<UnboundedSender<ProgressTick>>,
    ) -> ClientResult<u16> {
        let len = data.len();
        if plan.total() != len as u64 {
            return Err(ClientError::Protocol(format!(
                "progress plan covers {} bytes but body has {len}",
                plan.total()
            )));
        }

        let body = if len == 0 {
            // Nothing for the transport to pull; report the single 0/0 tick now.
            for tick in plan.ticks() {
                report(progress.as_ref(), tick);
            }
            reqwest::Body::from(Bytes::new())
        } else {
            let mut offset = 0usize;
            let chunks = plan.ticks().map(move |tick| {
                let end = usize::try_from(tick.sent).map_or(len, |sent| sent.min(len));
                let chunk = data.slice(offset..end);
                offset = end;
                report(progress.as_ref(), tick);
                Ok::<Bytes, std::io::Error>(chunk)
            });
            reqwest::Body::wrap_stream(futures::stream::iter(chunks))
        };

        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;
        let resp = ensure_success(resp, &[200, 201]).await?;
        Ok(resp.status().as_u16())
    }

    /// Request a URL for `name` and upload `data` to it.
    pub async fn upload(
        &self,
        name: &str,
        content_type: &str,
        data: Bytes,
        chunk_size: usize,
        progress: Option<UnboundedSender<ProgressTick>>,
    ) -> ClientResult<UploadOutcome> {
        let url = self.request_upload_url(name).await?;
        let size = data.len() as u64;
        let plan = ProgressPlan::new(size, chunk_size);
        let status = self
            .put_object(&url, content_type, data, plan, progress)
            .await?;

        let object_url = url.split_once('?').map_or(url.as_str(), |(base, _)| base);
        info!(key = %name, size, status, "Uploaded file");
        Ok(UploadOutcome {
            key: name.to_owned(),
            object_url: object_url.to_owned(),
            size,
            status,
        })
    }

    /// List the bucket.
    pub async fn list_files(&self) -> ClientResult<Vec<ObjectEntry>> {
        let resp = self.http.get(self.endpoint("/listFiles", &[])).send().await?;
        let resp = ensure_success(resp, &[200]).await?;
        resp.json()
            .await
            .map_err(|e| ClientError::Protocol(format!("invalid listing: {e}")))
    }

    /// Delete `key`.
    pub async fn delete_file(&self, key: &str) -> ClientResult<()> {
        let url = self.endpoint("/deleteFile", &[("key", key)]);
        let resp = self.http.delete(url).send().await?;
        ensure_success(resp, &[200]).await?;
        info!(key = %key, "Deleted file");
        Ok(())
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return format!("{}{path}", self.base_url);
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{}{path}?{query}", self.base_url)
    }
}

fn report(progress: Option<&UnboundedSender<ProgressTick>>, tick: ProgressTick) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(tick);
    }
}

/// Pass `resp` through if its status is in `accepted`, otherwise capture the
/// status and body as a [`ClientError::Transport`].
async fn ensure_success(
    resp: reqwest::Response,
    accepted: &[u16],
) -> ClientResult<reqwest::Response> {
    let status = resp.status().as_u16();
    if accepted.contains(&status) {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Transport { status, body })
}

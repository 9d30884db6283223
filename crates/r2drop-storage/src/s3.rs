//! S3-API backend.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::{DateTime, Utc};
use r2drop_core::{ObjectEntry, R2Config};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::gateway::StorageGateway;

/// Region R2 expects from S3 clients.
const R2_REGION: &str = "auto";

/// Gateway to an S3-compatible bucket using the server's own credentials.
#[derive(Clone)]
pub struct S3StorageGateway {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3StorageGateway {
    /// Build a client for the configured bucket and endpoint.
    #[must_use]
    pub fn new(config: &R2Config) -> Self {
        let credential = &config.credential;
        let endpoint = config.endpoint_url();
        let creds = Credentials::new(
            &credential.access_key_id,
            &credential.secret_access_key,
            None,
            None,
            "r2drop",
        );

        let sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(R2_REGION))
            .credentials_provider(creds)
            .endpoint_url(&endpoint)
            .force_path_style(true)
            .build();

        info!(bucket = %credential.bucket, endpoint = %endpoint, "Configured S3 storage gateway");

        Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config),
            bucket: credential.bucket.clone(),
            endpoint,
        }
    }

    /// The bucket this gateway addresses.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The endpoint base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for S3StorageGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3StorageGateway")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageGateway for S3StorageGateway {
    async fn list_objects(&self) -> StorageResult<Vec<ObjectEntry>> {
        let mut entries = Vec::new();
        let mut continuation_token = None;
        loop {
            let mut req = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = continuation_token.take() {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.map_err(|e| StorageError::Backend {
                operation: "ListObjectsV2",
                message: DisplayErrorContext(&e).to_string(),
            })?;

            for obj in resp.contents() {
                let Some(key) = obj.key() else { continue };
                let uploaded = obj
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
                    .unwrap_or_default();
                entries.push(ObjectEntry {
                    key: key.to_owned(),
                    size: obj.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                    uploaded,
                });
            }

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(ToOwned::to_owned);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        debug!(bucket = %self.bucket, count = entries.len(), "Listed objects");
        Ok(entries)
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend {
                operation: "DeleteObject",
                message: DisplayErrorContext(&e).to_string(),
            })?;
        debug!(bucket = %self.bucket, key = %key, "Deleted object");
        Ok(())
    }
}

//! The signing engine: turns an object key into a presigned upload URL.
//!
//! [`SigningEngine`] is built once from [`R2Config`] and shared read-only
//! across request handlers. Every call captures one clock reading, validates
//! its inputs, derives a fresh signing key, and assembles the URL. No state
//! survives between calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::{Method, Uri};
use r2drop_core::{Credential, MAX_PRESIGN_EXPIRY_SECS, R2Config};
use tracing::debug;

use crate::canonical::{
    CanonicalRequest, UNSIGNED_PAYLOAD, build_canonical_headers, build_canonical_query_string,
    build_signed_headers_string, encode_object_path,
};
use crate::error::SigningError;
use crate::presigned::PresignedUrl;
use crate::sigv4::{
    ALGORITHM, SigningTimestamp, build_credential_scope, build_string_to_sign, compute_signature,
    derive_signing_key,
};

/// Longest object key the backend accepts, in UTF-8 bytes.
pub const MAX_OBJECT_KEY_BYTES: usize = 1024;

/// Region R2 expects in the credential scope.
pub const DEFAULT_REGION: &str = "auto";

/// Service name in the credential scope.
pub const DEFAULT_SERVICE: &str = "s3";

/// The only header bound into a presigned URL's signature.
const SIGNED_HEADERS: [&str; 1] = ["host"];

/// What to presign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Object key, unencoded.
    pub key: String,
    /// HTTP method the URL authorizes.
    pub method: Method,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// Credential scope region.
    pub region: String,
    /// Credential scope service.
    pub service: String,
}

impl SigningRequest {
    /// A one-hour PUT of `key` in the `auto` region.
    pub fn put(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            method: Method::PUT,
            expires_in: r2drop_core::DEFAULT_PRESIGN_EXPIRY_SECS,
            region: DEFAULT_REGION.to_owned(),
            service: DEFAULT_SERVICE.to_owned(),
        }
    }

    /// Override the lifetime.
    #[must_use]
    pub fn with_expiry(mut self, expires_in: u64) -> Self {
        self.expires_in = expires_in;
        self
    }

    /// Override the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Override the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    fn validate(&self) -> Result<(), SigningError> {
        if self.key.is_empty() {
            return Err(SigningError::validation("name", "object key must not be empty"));
        }
        if self.key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(SigningError::validation(
                "name",
                "object key must not contain \".\" or \"..\" path segments",
            ));
        }
        if self.key.len() > MAX_OBJECT_KEY_BYTES {
            return Err(SigningError::validation(
                "name",
                format!(
                    "object key is {} bytes, limit is {MAX_OBJECT_KEY_BYTES}",
                    self.key.len()
                ),
            ));
        }
        if self.expires_in == 0 || self.expires_in > MAX_PRESIGN_EXPIRY_SECS {
            return Err(SigningError::validation(
                "expires",
                format!(
                    "expected seconds in 1..={MAX_PRESIGN_EXPIRY_SECS}, got {}",
                    self.expires_in
                ),
            ));
        }
        Ok(())
    }
}

/// Presigned URL generator bound to one bucket and endpoint.
#[derive(Debug, Clone)]
pub struct SigningEngine {
    credential: Arc<Credential>,
    endpoint: String,
    host: String,
    default_expiry_secs: u64,
}

impl SigningEngine {
    /// Create an engine for the configured bucket.
    ///
    /// Credentials are not checked here; a blank field surfaces as
    /// [`SigningError::Configuration`] on the first signing call.
    #[must_use]
    pub fn new(config: &R2Config) -> Self {
        let endpoint = config.endpoint_url();
        let host = endpoint_authority(&endpoint);
        Self {
            credential: Arc::new(config.credential.clone()),
            endpoint,
            host,
            default_expiry_secs: config.default_expiry_secs,
        }
    }

    /// The endpoint base URL, without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The value signed as the `host` header.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The bucket URLs are issued for.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.credential.bucket
    }

    /// A PUT request for `key` using the configured default expiry.
    pub fn default_request(&self, key: impl Into<String>) -> SigningRequest {
        SigningRequest::put(key).with_expiry(self.default_expiry_secs)
    }

    /// Presign `request` at the current time.
    ///
    /// # Errors
    ///
    /// See [`SigningEngine::presign_at`].
    pub fn presign(&self, request: &SigningRequest) -> Result<PresignedUrl, SigningError> {
        self.presign_at(request, Utc::now())
    }

    /// Presign `request` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Validation`] for an empty or oversized key or an
    /// out-of-range expiry, [`SigningError::Configuration`] when a credential
    /// field is blank, and [`SigningError::Computation`] if a primitive fails.
    pub fn presign_at(
        &self,
        request: &SigningRequest,
        now: DateTime<Utc>,
    ) -> Result<PresignedUrl, SigningError> {
        request.validate()?;
        if let Some(field) = self.credential.first_missing() {
            return Err(SigningError::Configuration(field));
        }

        let timestamp = SigningTimestamp::new(now);
        let scope = build_credential_scope(timestamp.date_stamp(), &request.region, &request.service);
        let credential = format!("{}/{scope}", self.credential.access_key_id);
        let expires = request.expires_in.to_string();
        let signed_headers = build_signed_headers_string(&SIGNED_HEADERS);

        let canonical = CanonicalRequest {
            method: request.method.as_str().to_owned(),
            uri: encode_object_path(&self.credential.bucket, &request.key),
            query: build_canonical_query_string(&[
                ("X-Amz-Algorithm", ALGORITHM),
                ("X-Amz-Credential", credential.as_str()),
                ("X-Amz-Date", timestamp.amz_date()),
                ("X-Amz-Expires", expires.as_str()),
                ("X-Amz-SignedHeaders", signed_headers.as_str()),
            ]),
            headers: build_canonical_headers(&[("host", self.host.as_str())], &SIGNED_HEADERS),
            signed_headers: build_signed_headers_string(&SIGNED_HEADERS),
            payload_hash: UNSIGNED_PAYLOAD.to_owned(),
        };

        debug!(key = %request.key, uri = %canonical.uri, scope = %scope, "Built canonical request");

        let string_to_sign = build_string_to_sign(timestamp.amz_date(), &scope, &canonical.hash());
        let signing_key = derive_signing_key(
            &self.credential.secret_access_key,
            timestamp.date_stamp(),
            &request.region,
            &request.service,
        )?;
        let signature = compute_signature(&signing_key, &string_to_sign)?;

        debug!(
            method = %request.method,
            key = %request.key,
            amz_date = %timestamp.amz_date(),
            expires_in = request.expires_in,
            "Issued presigned URL"
        );

        Ok(PresignedUrl::assemble(
            &self.endpoint,
            &canonical,
            signature,
            timestamp.amz_date(),
            request.expires_in,
        ))
    }
}

/// The `host[:port]` part of an endpoint URL, as a client sends it in `Host`.
///
/// [`R2Config::endpoint_url`] already lowercases the host and drops a default
/// port, so the authority is taken as is.
fn endpoint_authority(endpoint: &str) -> String {
    endpoint
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.authority().map(|a| a.as_str().to_ascii_lowercase()))
        .unwrap_or_else(|| endpoint.to_ascii_lowercase())
}

//! Presigned URL assembly and verification for AWS Signature Version 4.
//!
//! Presigned URLs carry authentication information in query parameters rather
//! than HTTP headers. The query parameters include:
//!
//! - `X-Amz-Algorithm` - Must be `AWS4-HMAC-SHA256`
//! - `X-Amz-Credential` - `AKID/date/region/service/aws4_request`
//! - `X-Amz-Date` - ISO 8601 basic format timestamp (`YYYYMMDDTHHMMSSZ`)
//! - `X-Amz-Expires` - Validity duration in seconds
//! - `X-Amz-SignedHeaders` - Semicolon-separated signed header names
//! - `X-Amz-Signature` - The hex-encoded signature
//!
//! For presigned URLs, the payload hash is always `UNSIGNED-PAYLOAD`.
//!
//! [`verify_presigned`] is the backend's side of the exchange. r2drop never
//! needs it to issue URLs; it exists so an issued URL can be checked
//! independently of the code that signed it.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use r2drop_core::{Credential, MAX_PRESIGN_EXPIRY_SECS};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{
    CanonicalRequest, UNSIGNED_PAYLOAD, build_canonical_headers, build_signed_headers_string,
    canonicalize_raw_query, normalize_uri_path,
};
use crate::error::SigningError;
use crate::sigv4::{
    ALGORITHM, SCOPE_TERMINATOR, build_credential_scope, build_string_to_sign, compute_signature,
    derive_signing_key,
};

/// A signed, time-limited URL authorizing one request against the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    url: String,
    signature: String,
    amz_date: String,
    expires_in: u64,
}

impl PresignedUrl {
    /// Assemble the final URL from its already-canonical parts.
    ///
    /// The result is `<endpoint><path>?<query>&X-Amz-Signature=<signature>` and
    /// is usable verbatim as the request target.
    #[must_use]
    pub fn assemble(
        endpoint: &str,
        canonical: &CanonicalRequest,
        signature: String,
        amz_date: &str,
        expires_in: u64,
    ) -> Self {
        let url = format!(
            "{endpoint}{}?{}&X-Amz-Signature={signature}",
            canonical.uri, canonical.query
        );
        Self {
            url,
            signature,
            amz_date: amz_date.to_owned(),
            expires_in,
        }
    }

    /// The complete URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The URL with its query string removed: the object's plain address.
    #[must_use]
    pub fn object_url(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(base, _)| base)
    }

    /// The hex-encoded signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The signing timestamp, `YYYYMMDDTHHMMSSZ`.
    #[must_use]
    pub fn amz_date(&self) -> &str {
        &self.amz_date
    }

    /// Lifetime in seconds.
    #[must_use]
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// Consume the value, returning the URL.
    #[must_use]
    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Parsed components from presigned URL query parameters.
#[derive(Debug, Clone)]
pub struct ParsedPresignedParams {
    /// The access key ID.
    pub access_key_id: String,
    /// The date component of the credential scope (YYYYMMDD).
    pub date: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The ISO 8601 basic format timestamp.
    pub timestamp: String,
    /// The URL validity duration in seconds.
    pub expires: u64,
    /// The list of signed header names.
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

/// Parse presigned URL query parameters into their components.
///
/// # Errors
///
/// Returns [`SigningError::MissingQueryParam`] if any required parameter is absent,
/// [`SigningError::UnsupportedAlgorithm`] if the algorithm is not `AWS4-HMAC-SHA256`,
/// or [`SigningError::InvalidCredential`] if the credential format is invalid.
pub fn parse_presigned_params(query: &str) -> Result<ParsedPresignedParams, SigningError> {
    let params: HashMap<String, String> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            Some((key.to_owned(), url_decode(value)))
        })
        .collect();

    let algorithm = get_required_param(&params, "X-Amz-Algorithm")?;
    if algorithm != ALGORITHM {
        return Err(SigningError::UnsupportedAlgorithm(algorithm));
    }

    let credential = get_required_param(&params, "X-Amz-Credential")?;
    let timestamp = get_required_param(&params, "X-Amz-Date")?;
    let expires_str = get_required_param(&params, "X-Amz-Expires")?;
    let signed_headers_str = get_required_param(&params, "X-Amz-SignedHeaders")?;
    let signature = get_required_param(&params, "X-Amz-Signature")?;

    // AKID/date/region/service/aws4_request
    let cred_parts: Vec<&str> = credential.splitn(5, '/').collect();
    if cred_parts.len() != 5 || cred_parts[4] != SCOPE_TERMINATOR {
        return Err(SigningError::InvalidCredential);
    }

    let expires: u64 = expires_str.parse().map_err(|_| {
        SigningError::MissingQueryParam("X-Amz-Expires (invalid integer)".to_owned())
    })?;
    if expires > MAX_PRESIGN_EXPIRY_SECS {
        return Err(SigningError::validation(
            "X-Amz-Expires",
            format!("must be at most {MAX_PRESIGN_EXPIRY_SECS} seconds, got {expires}"),
        ));
    }

    let signed_headers: Vec<String> = signed_headers_str
        .split(';')
        .map(ToOwned::to_owned)
        .collect();

    Ok(ParsedPresignedParams {
        access_key_id: cred_parts[0].to_owned(),
        date: cred_parts[1].to_owned(),
        region: cred_parts[2].to_owned(),
        service: cred_parts[3].to_owned(),
        timestamp,
        expires,
        signed_headers,
        signature,
    })
}

/// Verify a request that carries a presigned query string.
///
/// This function:
/// 1. Parses the presigned URL query parameters
/// 2. Checks whether the URL has expired relative to `now`
/// 3. Checks the access key against `credential`
/// 4. Reconstructs the canonical request (excluding `X-Amz-Signature` from query)
/// 5. Computes the expected signature
/// 6. Compares signatures using constant-time comparison
///
/// # Errors
///
/// Returns a [`SigningError`] if parameters are missing or malformed, the URL
/// has expired, the access key differs, a signed header is missing, or the
/// signature does not match.
pub fn verify_presigned(
    parts: &http::request::Parts,
    credential: &Credential,
    now: DateTime<Utc>,
) -> Result<ParsedPresignedParams, SigningError> {
    let query = parts.uri.query().unwrap_or("");
    let parsed = parse_presigned_params(query)?;

    debug!(
        date = %parsed.date,
        region = %parsed.region,
        service = %parsed.service,
        expires = parsed.expires,
        "Verifying presigned URL"
    );

    check_expiration(&parsed.timestamp, parsed.expires, now)?;

    if parsed.access_key_id != credential.access_key_id {
        return Err(SigningError::AccessKeyMismatch(parsed.access_key_id));
    }

    let signed_header_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
    let header_pairs = collect_signed_headers(parts, &signed_header_refs)?;

    let canonical = CanonicalRequest {
        method: parts.method.as_str().to_owned(),
        uri: normalize_uri_path(parts.uri.path()),
        query: canonicalize_raw_query(query),
        headers: build_canonical_headers(&header_pairs, &signed_header_refs),
        signed_headers: build_signed_headers_string(&signed_header_refs),
        payload_hash: UNSIGNED_PAYLOAD.to_owned(),
    };

    let credential_scope = build_credential_scope(&parsed.date, &parsed.region, &parsed.service);
    debug!(
        method = %canonical.method,
        uri = %canonical.uri,
        scope = %credential_scope,
        "Built presigned canonical request"
    );

    let string_to_sign = build_string_to_sign(&parsed.timestamp, &credential_scope, &canonical.hash());

    let signing_key = derive_signing_key(
        &credential.secret_access_key,
        &parsed.date,
        &parsed.region,
        &parsed.service,
    )?;
    let expected_signature = compute_signature(&signing_key, &string_to_sign)?;

    if parsed
        .signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into()
    {
        debug!(uri = %canonical.uri, "Presigned URL verification succeeded");
        Ok(parsed)
    } else {
        debug!(
            expected = %expected_signature,
            provided = %parsed.signature,
            "Presigned URL signature mismatch"
        );
        Err(SigningError::SignatureDoesNotMatch)
    }
}

/// Check whether the presigned URL has expired.
fn check_expiration(timestamp: &str, expires: u64, now: DateTime<Utc>) -> Result<(), SigningError> {
    let request_time = NaiveDateTime::parse_from_str(timestamp, "%Y%m%dT%H%M%SZ")
        .map_err(|_| SigningError::MissingQueryParam("X-Amz-Date (invalid format)".to_owned()))?;

    let expiry_time = i64::try_from(expires)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| request_time.checked_add_signed(lifetime))
        .ok_or(SigningError::RequestExpired)?;

    if now.naive_utc() > expiry_time {
        return Err(SigningError::RequestExpired);
    }

    Ok(())
}

/// Collect header values for the signed headers from the request.
fn collect_signed_headers<'a>(
    parts: &'a http::request::Parts,
    signed_headers: &[&'a str],
) -> Result<Vec<(&'a str, &'a str)>, SigningError> {
    let mut result = Vec::with_capacity(signed_headers.len());

    for &name in signed_headers {
        let value = parts
            .headers
            .get(name)
            .ok_or_else(|| SigningError::MissingHeader(name.to_owned()))?
            .to_str()
            .map_err(|_| SigningError::MissingHeader(name.to_owned()))?;
        result.push((name, value));
    }

    Ok(result)
}

/// Perform basic percent-decoding of a URL-encoded string.
fn url_decode(input: &str) -> String {
    percent_encoding::percent_decode_str(input)
        .decode_utf8_lossy()
        .into_owned()
}

/// Extract a required query parameter, returning an error if missing.
fn get_required_param(
    params: &HashMap<String, String>,
    name: &str,
) -> Result<String, SigningError> {
    params
        .get(name)
        .cloned()
        .ok_or_else(|| SigningError::MissingQueryParam(name.to_owned()))
}

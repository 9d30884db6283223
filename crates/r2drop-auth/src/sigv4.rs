//! AWS Signature Version 4 primitives.
//!
//! This module holds the two cryptographic stages of SigV4 signing:
//!
//! 1. The key derivation chain: four HMAC-SHA256 applications that bind the
//!    secret to one (date, region, service) scope.
//! 2. The string to sign and the final signature over it.
//!
//! Intermediate keys stay raw bytes throughout; only the final signature is
//! hex-encoded.

use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

use crate::error::SigningError;

/// The only algorithm supported by this implementation.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Terminator of every credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

type HmacSha256 = Hmac<Sha256>;

/// A signing instant in both SigV4 formats, captured from one clock reading.
///
/// The date stamp is always the first eight characters of the full timestamp,
/// so the two forms can never straddle a UTC midnight.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use r2drop_auth::SigningTimestamp;
///
/// let ts = SigningTimestamp::new(Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap());
/// assert_eq!(ts.amz_date(), "20130524T000000Z");
/// assert_eq!(ts.date_stamp(), "20130524");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningTimestamp {
    amz_date: String,
}

impl SigningTimestamp {
    /// Capture the given instant.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            amz_date: now.format("%Y%m%dT%H%M%SZ").to_string(),
        }
    }

    /// Full timestamp, `YYYYMMDDTHHMMSSZ`.
    #[must_use]
    pub fn amz_date(&self) -> &str {
        &self.amz_date
    }

    /// Date-only form, `YYYYMMDD`.
    #[must_use]
    pub fn date_stamp(&self) -> &str {
        &self.amz_date[..8]
    }
}

/// A derived per-scope signing key (raw HMAC-SHA256 output).
///
/// Recomputed for every signing call and never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Build the credential scope `<date>/<region>/<service>/aws4_request`.
#[must_use]
pub fn build_credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{date_stamp}/{region}/{service}/{SCOPE_TERMINATOR}")
}

/// Build the SigV4 string to sign.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
///
/// # Examples
///
/// ```
/// use r2drop_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/auto/s3/aws4_request",
///     "5618ff773383b4f6a08191c46d3d1485de0665fd4c3787957bbeea3a2d074ab2",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using the HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
///
/// # Examples
///
/// ```
/// use r2drop_auth::derive_signing_key;
///
/// let key = derive_signing_key(
///     "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
///     "20130524",
///     "auto",
///     "s3",
/// )
/// .unwrap();
/// assert_eq!(key.as_bytes().len(), 32);
/// ```
pub fn derive_signing_key(
    secret_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<SigningKey, SigningError> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes())?;
    let date_region_key = hmac_sha256(&date_key, region.as_bytes())?;
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes())?;
    let signing_key = hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())?;
    Ok(SigningKey(signing_key))
}

/// Compute the lowercase hex HMAC-SHA256 signature of `string_to_sign`.
pub fn compute_signature(
    signing_key: &SigningKey,
    string_to_sign: &str,
) -> Result<String, SigningError> {
    let sig = hmac_sha256(signing_key.as_bytes(), string_to_sign.as_bytes())?;
    Ok(hex::encode(sig))
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(key)
        .map_err(|e| SigningError::Computation(format!("HMAC key rejected: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

//! Process configuration.
//!
//! Provides [`R2Config`] (backend credentials and signing defaults) and
//! [`ServerConfig`] (listener and logging). Both are loaded from environment
//! variables once at startup; after that they are read-only.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Credential, CredentialField};

/// Default lifetime of an issued upload URL, in seconds.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

/// Longest lifetime the backend accepts for a presigned URL (seven days).
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// Backend configuration: credentials, endpoint, and signing defaults.
///
/// # Examples
///
/// ```
/// use r2drop_core::R2Config;
///
/// let config = R2Config::from_vars(|name| match name {
///     "R2_ACCOUNT_ID" => Some("acct".to_owned()),
///     "R2_ACCESS_KEY_ID" => Some("AKID".to_owned()),
///     "R2_SECRET_ACCESS_KEY" => Some("secret".to_owned()),
///     "R2_BUCKET_NAME" => Some("uploads".to_owned()),
///     _ => None,
/// })
/// .unwrap();
/// assert_eq!(config.endpoint_url(), "https://acct.r2.cloudflarestorage.com");
/// ```
#[derive(Debug, Clone)]
pub struct R2Config {
    /// Backend credentials and bucket.
    pub credential: Credential,
    /// Endpoint override; `None` means the account's R2 endpoint.
    pub endpoint_override: Option<String>,
    /// Expiry used when a caller does not request one.
    pub default_expiry_secs: u64,
}

impl R2Config {
    /// Create a configuration with the default endpoint and expiry.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            endpoint_override: None,
            default_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
        }
    }

    /// Use a different endpoint (S3-compatible backends, local testing).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    /// Load configuration from the process environment.
    ///
    /// | Variable | Required | Default |
    /// |----------|----------|---------|
    /// | `R2_ACCOUNT_ID` | yes | |
    /// | `R2_ACCESS_KEY_ID` | yes | |
    /// | `R2_SECRET_ACCESS_KEY` | yes | |
    /// | `R2_BUCKET_NAME` | yes | |
    /// | `R2_ENDPOINT_URL` | no | `https://<account>.r2.cloudflarestorage.com` |
    /// | `R2_PRESIGN_EXPIRY` | no | `3600` |
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Every missing required variable is reported at once; blank values
    /// count as missing.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = CredentialField::ALL
            .iter()
            .map(|f| f.env_var())
            .filter(|name| get(name).is_none())
            .map(ToOwned::to_owned)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        let required = |field: CredentialField| get(field.env_var()).unwrap_or_default();
        let credential = Credential::new(
            required(CredentialField::AccountId),
            required(CredentialField::AccessKeyId),
            required(CredentialField::SecretAccessKey),
            required(CredentialField::BucketName),
        );

        let mut config = Self::new(credential);

        if let Some(v) = get("R2_ENDPOINT_URL") {
            let endpoint = normalize_endpoint(&v).map_err(|reason| ConfigError::InvalidValue {
                name: "R2_ENDPOINT_URL".to_owned(),
                reason,
            })?;
            config.endpoint_override = Some(endpoint);
        }
        if let Some(v) = get("R2_PRESIGN_EXPIRY") {
            config.default_expiry_secs = parse_expiry(&v)?;
        }

        Ok(config)
    }

    /// The endpoint base URL: scheme and authority only, host lowercased,
    /// default port omitted.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint_override {
            Some(url) => {
                normalize_endpoint(url).unwrap_or_else(|_| url.trim_end_matches('/').to_owned())
            }
            None => format!(
                "https://{}.r2.cloudflarestorage.com",
                self.credential.account_id
            ),
        }
    }
}

/// Reduce an endpoint URL to `scheme://host[:port]` in the form clients put
/// on the wire.
///
/// Presigned URLs are `<endpoint>/<bucket>/<key>` and only the bucket and key
/// are signed as the path, so the endpoint must not carry a path, query, or
/// userinfo of its own. The host is lowercased and the scheme's default port
/// dropped because that is what clients send as `Host`.
fn normalize_endpoint(raw: &str) -> Result<String, String> {
    let uri: http::Uri = raw
        .trim()
        .parse()
        .map_err(|e| format!("expected an http(s) URL, got {raw:?}: {e}"))?;

    let (scheme, default_port) = match uri.scheme_str() {
        Some("https") => ("https", 443),
        Some("http") => ("http", 80),
        _ => return Err(format!("expected an http(s) URL, got {raw:?}")),
    };
    let authority = uri
        .authority()
        .ok_or_else(|| format!("missing host in {raw:?}"))?;
    if authority.as_str().contains('@') {
        return Err("credentials must not be embedded in the endpoint URL".to_owned());
    }
    if !matches!(uri.path(), "" | "/") {
        return Err(format!(
            "endpoint must not include a path, got {:?}",
            uri.path()
        ));
    }
    if uri.query().is_some() {
        return Err("endpoint must not include a query string".to_owned());
    }

    let host = authority.host().to_ascii_lowercase();
    Ok(match authority.port_u16() {
        Some(port) if port != default_port => format!("{scheme}://{host}:{port}"),
        _ => format!("{scheme}://{host}"),
    })
}

/// Parse an expiry in seconds, accepting only `1..=MAX_PRESIGN_EXPIRY_SECS`.
fn parse_expiry(value: &str) -> ConfigResult<u64> {
    let invalid = || ConfigError::InvalidValue {
        name: "R2_PRESIGN_EXPIRY".to_owned(),
        reason: format!("expected seconds in 1..={MAX_PRESIGN_EXPIRY_SECS}, got {value:?}"),
    };
    let secs: u64 = value.trim().parse().map_err(|_| invalid())?;
    if secs == 0 || secs > MAX_PRESIGN_EXPIRY_SECS {
        return Err(invalid());
    }
    Ok(secs)
}

/// Listener and logging configuration for the server binary.
///
/// # Examples
///
/// ```
/// use r2drop_core::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8788");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address (e.g. `"0.0.0.0:8788"`).
    #[builder(default = String::from("0.0.0.0:8788"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:8788"),
            log_level: String::from("info"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `GATEWAY_LISTEN` and `LOG_LEVEL`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

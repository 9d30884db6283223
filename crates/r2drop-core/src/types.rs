//! Shared type definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one field of a [`Credential`], named after its environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    /// The account (endpoint) identifier.
    AccountId,
    /// The access key ID.
    AccessKeyId,
    /// The secret access key.
    SecretAccessKey,
    /// The bucket name.
    BucketName,
}

impl CredentialField {
    /// All fields, in the order they are checked.
    pub const ALL: [Self; 4] = [
        Self::AccountId,
        Self::AccessKeyId,
        Self::SecretAccessKey,
        Self::BucketName,
    ];

    /// The environment variable that supplies this field.
    #[must_use]
    pub fn env_var(self) -> &'static str {
        match self {
            Self::AccountId => "R2_ACCOUNT_ID",
            Self::AccessKeyId => "R2_ACCESS_KEY_ID",
            Self::SecretAccessKey => "R2_SECRET_ACCESS_KEY",
            Self::BucketName => "R2_BUCKET_NAME",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// Backend credentials and the bucket they address.
///
/// The secret is never printed: the `Debug` implementation redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// The account (endpoint) identifier.
    pub account_id: String,
    /// The access key ID.
    pub access_key_id: String,
    /// The secret access key.
    pub secret_access_key: String,
    /// The bucket name.
    pub bucket: String,
}

impl Credential {
    /// Create a credential from its four parts.
    pub fn new(
        account_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            bucket: bucket.into(),
        }
    }

    /// Value of the given field.
    #[must_use]
    pub fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::AccountId => &self.account_id,
            CredentialField::AccessKeyId => &self.access_key_id,
            CredentialField::SecretAccessKey => &self.secret_access_key,
            CredentialField::BucketName => &self.bucket,
        }
    }

    /// The first field that is empty or whitespace-only, if any.
    #[must_use]
    pub fn first_missing(&self) -> Option<CredentialField> {
        CredentialField::ALL
            .into_iter()
            .find(|f| self.field(*f).trim().is_empty())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// One object in the bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// The object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified time.
    pub uploaded: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let cred = Credential::new("acct", "AKIDEXAMPLE", "super-secret", "bucket");
        let printed = format!("{cred:?}");
        assert!(printed.contains("AKIDEXAMPLE"));
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_should_report_first_blank_field() {
        let cred = Credential::new("acct", "AKID", "  ", "");
        assert_eq!(cred.first_missing(), Some(CredentialField::SecretAccessKey));

        let cred = Credential::new("acct", "AKID", "secret", "bucket");
        assert_eq!(cred.first_missing(), None);
    }

    #[test]
    fn test_should_name_fields_after_env_vars() {
        assert_eq!(CredentialField::BucketName.to_string(), "R2_BUCKET_NAME");
        assert_eq!(CredentialField::AccessKeyId.env_var(), "R2_ACCESS_KEY_ID");
    }

    #[test]
    fn test_should_serialize_object_entry_with_rfc3339_timestamp() {
        let entry = ObjectEntry {
            key: "photo.png".to_owned(),
            size: 2048,
            uploaded: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "photo.png");
        assert_eq!(json["size"], 2048);
        assert_eq!(json["uploaded"], "2024-01-02T03:04:05Z");
    }
}

// Definition of a bucket
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;
use std::fmt;

/// Region label used for buckets whose location could not be determined.
pub const UNKNOWN_REGION: &str = "unknown";

/// Versioning state of a bucket.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Versioning {
    /// Versioning is on.
    Enabled,

    /// Versioning was on at some point and has been suspended.
    Suspended,

    /// Versioning has never been enabled.
    Disabled,
}

impl Versioning {
    /// Map the status string S3 returns. S3 omits the status entirely for
    /// buckets that never had versioning enabled.
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some("Enabled")   => Self::Enabled,
            Some("Suspended") => Self::Suspended,
            _                 => Self::Disabled,
        }
    }

    /// Returns the state as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled   => "enabled",
            Self::Suspended => "suspended",
            Self::Disabled  => "disabled",
        }
    }
}

impl fmt::Display for Versioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings that guard against, or schedule, object deletion.
///
/// Each flag is `None` when its lookup failed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DeletionPolicy {
    /// The bucket has a lifecycle configuration with at least one rule.
    pub lifecycle_rules: Option<bool>,

    /// MFA delete is enabled in the versioning configuration.
    pub mfa_delete: Option<bool>,

    /// Object lock is enabled.
    pub object_lock: Option<bool>,
}

/// Represents an S3 bucket as seen by the inventory.
///
/// This will always have a `name`. Every other attribute is `None` if the
/// call fetching it failed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bucket {
    /// Bucket name, unique within the account.
    pub name: String,

    /// Region the bucket lives in.
    pub region: Option<String>,

    /// When the bucket was created.
    pub created: Option<DateTime<Utc>>,

    /// Versioning state.
    pub versioning: Option<Versioning>,

    /// Deletion protection and expiry settings.
    pub deletion: DeletionPolicy,
}

impl Bucket {
    /// A bucket with only a name and creation date known.
    pub fn new(name: impl Into<String>, created: Option<DateTime<Utc>>) -> Self {
        Self {
            name:       name.into(),
            region:     None,
            created,
            versioning: None,
            deletion:   DeletionPolicy::default(),
        }
    }

    /// The region the bucket is grouped under in the report.
    pub fn region_name(&self) -> &str {
        self.region.as_deref().unwrap_or(UNKNOWN_REGION)
    }
}

/// Convenience type for a list of `Bucket`.
pub type Buckets = Vec<Bucket>;

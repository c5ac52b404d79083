// UsageSample
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;

/// Unit every usage sample is reported in.
pub const USAGE_UNIT: &str = "Bytes";

/// Stored bytes for a bucket, if the metrics backend had any.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Usage {
    /// Bytes from the most recent daily datapoint, summed over storage types.
    Known {
        /// Total stored bytes.
        bytes: u64,

        /// Timestamp of the newest datapoint used.
        as_of: DateTime<Utc>,
    },

    /// No datapoints were published for the lookback window. Usual for new
    /// or empty buckets.
    Unknown,
}

/// Usage metrics for one bucket.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsageSample {
    /// Bucket the sample belongs to.
    pub bucket: String,

    /// Stored bytes, or unknown.
    pub usage: Usage,

    /// Unit of `usage`.
    pub unit: &'static str,

    /// Storage types that contributed a datapoint.
    pub storage_types: Vec<String>,

    /// When the sample was collected.
    pub collected_at: DateTime<Utc>,
}

impl UsageSample {
    /// Total stored bytes if known.
    pub fn bytes(&self) -> Option<u64> {
        match self.usage {
            Usage::Known { bytes, .. } => Some(bytes),
            Usage::Unknown             => None,
        }
    }
}

// BucketRecord: one bucket and everything collected about it
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use serde::Serialize;
use std::fmt;
use super::{
    Bucket,
    CostEstimate,
    ObjectSampleSummary,
    UsageSample,
};

/// The per-bucket collectors.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collector {
    /// CloudWatch storage metrics.
    Usage,

    /// Cost Explorer estimate.
    Cost,

    /// Object listing sample.
    Sample,
}

impl Collector {
    /// Returns the collector name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usage  => "usage",
            Self::Cost   => "cost",
            Self::Sample => "sample",
        }
    }
}

impl fmt::Display for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marks a sub-result that is missing because its collector failed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectionFailure {
    /// The collector that failed.
    pub collector: Collector,

    /// Why it failed.
    pub reason: String,
}

/// Everything collected for one bucket.
///
/// A sub-result is `None` exactly when a matching `CollectionFailure` is
/// present in `failures`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BucketRecord {
    /// Inventory metadata.
    pub bucket: Bucket,

    /// Storage metrics.
    pub usage: Option<UsageSample>,

    /// Cost estimate.
    pub cost: Option<CostEstimate>,

    /// Object sample.
    pub sample: Option<ObjectSampleSummary>,

    /// Collectors that failed for this bucket.
    pub failures: Vec<CollectionFailure>,

    /// Whether the bucket saw writes within the activity window, judged
    /// from the object sample.
    pub active: Option<bool>,
}

impl BucketRecord {
    /// Returns `true` if any collector failed for this bucket.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns `true` if `collector` failed for this bucket.
    pub fn has_failed(&self, collector: Collector) -> bool {
        self.failures.iter().any(|f| f.collector == collector)
    }

    /// Collectors that failed, in the order they were recorded.
    pub fn failed_collectors(&self) -> Vec<Collector> {
        self.failures.iter().map(|f| f.collector).collect()
    }

    /// Stored bytes, when the usage collector succeeded and had data.
    pub fn known_bytes(&self) -> Option<u64> {
        self.usage.as_ref().and_then(UsageSample::bytes)
    }

    /// Cost amount and currency, when available.
    pub fn known_cost(&self) -> Option<(f64, &str)> {
        self.cost.as_ref().and_then(CostEstimate::amount)
    }
}

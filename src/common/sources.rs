// Backend traits
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use chrono::{
    DateTime,
    Duration,
    Utc,
};
use crate::model::{
    BillingPeriod,
    Bucket,
    Cost,
    Versioning,
};
use std::sync::Arc;
use super::CollectError;
use super::paging::Page;

/// Versioning configuration of a bucket.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VersioningStatus {
    /// Versioning state.
    pub state: Versioning,

    /// MFA delete is enabled.
    pub mfa_delete: bool,
}

/// One entry of an object listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectEntry {
    /// Object key.
    pub key: String,

    /// Last modification time, if the listing returned one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One storage metric datapoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeDatapoint {
    /// Start of the period the datapoint covers.
    pub timestamp: DateTime<Utc>,

    /// Average stored bytes over the period.
    pub average: f64,
}

/// Time range searched for usage datapoints.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MetricWindow {
    /// Start of the range.
    pub start: DateTime<Utc>,

    /// End of the range.
    pub end: DateTime<Utc>,
}

impl MetricWindow {
    /// The window of length `lookback` ending at `end`.
    pub fn ending(end: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            start: end - lookback,
            end,
        }
    }
}

/// Bucket listing and bucket level metadata.
///
/// `region` arguments are the bucket's own region where it is known, so
/// implementations can send the request to the right endpoint.
#[async_trait]
pub trait BucketSource: Send + Sync {
    /// Return one page of the account's buckets.
    async fn list_buckets_page(
        &self,
        token: Option<String>,
    ) -> Result<Page<Bucket>, CollectError>;

    /// Return the region `bucket` lives in.
    async fn bucket_region(&self, bucket: &str) -> Result<String, CollectError>;

    /// Check that `bucket` exists and is reachable.
    async fn head_bucket(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<(), CollectError>;

    /// Return the versioning configuration of `bucket`.
    async fn versioning(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<VersioningStatus, CollectError>;

    /// Return whether `bucket` has lifecycle rules.
    async fn lifecycle_rules(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<bool, CollectError>;

    /// Return whether object lock is enabled on `bucket`.
    async fn object_lock(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<bool, CollectError>;
}

/// Object listings.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Return one page of at most `max_keys` objects from `bucket`, in key
    /// order.
    async fn list_objects_page(
        &self,
        bucket: &str,
        region: Option<&str>,
        token: Option<String>,
        max_keys: i32,
    ) -> Result<Page<ObjectEntry>, CollectError>;
}

/// Storage metrics.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Return the storage types publishing size metrics for `bucket`.
    async fn storage_types(
        &self,
        bucket: &str,
        region: Option<&str>,
    ) -> Result<Vec<String>, CollectError>;

    /// Return daily size datapoints for one storage type of `bucket`.
    async fn datapoints(
        &self,
        bucket: &str,
        region: Option<&str>,
        storage_type: &str,
        window: &MetricWindow,
    ) -> Result<Vec<SizeDatapoint>, CollectError>;
}

/// Billing data.
#[async_trait]
pub trait CostSource: Send + Sync {
    /// Return the cost of `bucket` over `period`.
    ///
    /// Missing or disabled cost data is a `Cost` value, not an error.
    async fn bucket_cost(
        &self,
        bucket: &str,
        period: &BillingPeriod,
    ) -> Result<Cost, CollectError>;
}

/// The backend clients a run talks to.
#[derive(Clone)]
pub struct Backends {
    /// Bucket listing and metadata.
    pub buckets: Arc<dyn BucketSource>,

    /// Object listings.
    pub objects: Arc<dyn ObjectSource>,

    /// Storage metrics.
    pub usage: Arc<dyn UsageSource>,

    /// Billing data.
    pub cost: Arc<dyn CostSource>,
}

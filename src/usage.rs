// UsageMetricsCollector: stored bytes per bucket from storage metrics
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::Utc;
use crate::common::{
    CollectError,
    MetricWindow,
    RetryPolicy,
    SizeDatapoint,
    UsageSource,
};
use crate::model::{
    Bucket,
    Usage,
    UsageSample,
    USAGE_UNIT,
};
use futures::future::try_join_all;
use tracing::debug;

/// Collects `UsageSample`s through a `UsageSource`.
pub struct UsageMetricsCollector<'a> {
    source: &'a dyn UsageSource,
    retry:  &'a RetryPolicy,
}

impl<'a> UsageMetricsCollector<'a> {
    /// Return a new collector reading from `source`.
    pub fn new(source: &'a dyn UsageSource, retry: &'a RetryPolicy) -> Self {
        Self {
            source,
            retry,
        }
    }

    /// Return the stored bytes of `bucket` according to the most recent
    /// datapoint inside `window`.
    ///
    /// Storage types are discovered first, then each one is queried. The
    /// newest datapoint of every storage type is summed. A bucket with no
    /// metrics at all gets `Usage::Unknown`, which is normal for new or
    /// empty buckets.
    pub async fn get_usage(
        &self,
        bucket: &Bucket,
        window: &MetricWindow,
    ) -> Result<UsageSample, CollectError> {
        let name = bucket.name.as_str();
        let region = bucket.region.as_deref();

        let storage_types = self.retry
            .run("ListMetrics", name, || self.source.storage_types(name, region))
            .await?;

        debug!("get_usage: '{}' has storage types {:?}", name, storage_types);

        let latest = try_join_all(storage_types.iter().map(|storage_type| {
            self.latest_datapoint(name, region, storage_type, window)
        }))
        .await?;

        let latest: Vec<(String, SizeDatapoint)> = storage_types
            .into_iter()
            .zip(latest)
            .filter_map(|(storage_type, datapoint)| {
                datapoint.map(|datapoint| (storage_type, datapoint))
            })
            .collect();

        let (usage, storage_types) = summarise(latest);

        debug!("get_usage: '{}' -> {:?}", name, usage);

        Ok(UsageSample {
            bucket:       name.to_string(),
            usage,
            unit:         USAGE_UNIT,
            storage_types,
            collected_at: Utc::now(),
        })
    }

    // The newest datapoint for one storage type, if any was published.
    async fn latest_datapoint(
        &self,
        bucket: &str,
        region: Option<&str>,
        storage_type: &str,
        window: &MetricWindow,
    ) -> Result<Option<SizeDatapoint>, CollectError> {
        let datapoints = self.retry
            .run("GetMetricStatistics", bucket, || {
                self.source.datapoints(bucket, region, storage_type, window)
            })
            .await?;

        let latest = datapoints
            .into_iter()
            .max_by_key(|datapoint| datapoint.timestamp);

        Ok(latest)
    }
}

// Sum the latest datapoint of each storage type.
fn summarise(latest: Vec<(String, SizeDatapoint)>) -> (Usage, Vec<String>) {
    let as_of = match latest.iter().map(|(_, d)| d.timestamp).max() {
        Some(as_of) => as_of,
        None        => return (Usage::Unknown, Vec::new()),
    };

    let bytes: u64 = latest
        .iter()
        .map(|(_, d)| d.average.max(0.0).round() as u64)
        .sum();

    let storage_types = latest
        .into_iter()
        .map(|(storage_type, _)| storage_type)
        .collect();

    (Usage::Known { bytes, as_of }, storage_types)
}

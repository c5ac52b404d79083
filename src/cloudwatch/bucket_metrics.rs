// BucketMetrics: storage types per bucket from discovered metrics
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use aws_sdk_cloudwatch::types::Metric;
use std::collections::BTreeMap;
use tracing::debug;

type StorageTypes = Vec<String>;

/// Storage types keyed by bucket name, built from `BucketSizeBytes` metrics.
#[derive(Debug, Default, PartialEq)]
pub struct BucketMetrics(pub BTreeMap<String, StorageTypes>);

impl BucketMetrics {
    /// Return the storage types of a given bucket, in discovery order.
    pub fn storage_types(&self, bucket: &str) -> StorageTypes {
        debug!("BucketMetrics::storage_types: Looking up '{}'", bucket);

        self.0.get(bucket).cloned().unwrap_or_default()
    }
}

// Conversion from the metrics returned by AWS to our BucketMetrics
impl From<&[Metric]> for BucketMetrics {
    fn from(metrics: &[Metric]) -> Self {
        let mut bucket_metrics = BTreeMap::new();

        for metric in metrics {
            let mut name = None;
            let mut storage_type = None;

            // Process the dimensions, taking the bucket name and storage type
            for dimension in metric.dimensions() {
                match dimension.name() {
                    Some("BucketName")  => name         = dimension.value(),
                    Some("StorageType") => storage_type = dimension.value(),
                    _                   => {},
                }
            }

            // A metric missing either dimension isn't one of ours.
            let (name, storage_type) = match (name, storage_type) {
                (Some(name), Some(storage_type)) => (name, storage_type),
                _                                => continue,
            };

            let storage_types: &mut StorageTypes = bucket_metrics
                .entry(name.to_string())
                .or_default();

            if !storage_types.iter().any(|s| s == storage_type) {
                storage_types.push(storage_type.to_string());
            }
        }

        BucketMetrics(bucket_metrics)
    }
}

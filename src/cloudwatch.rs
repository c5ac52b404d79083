// Imports all of the components needed for cloudwatch::client
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// `BucketMetrics` handles returning the storage types from discovered
/// CloudWatch metrics.
mod bucket_metrics;

/// CloudWatch `Client`.
mod client;

/// Implementation of the `UsageSource` trait for our CloudWatch `Client`.
mod usage_source;

pub use client::*;
